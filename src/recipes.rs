//! Crafting recipes - define what workstations produce
//!
//! Recipes specify input materials (exact resources or tag expressions),
//! outputs (resources or items), work required, and which workstation
//! executes them. Tag inputs keep recipes generic ("any meat") instead of
//! one recipe per item.

use serde::Deserialize;

use crate::items::{MaterialRequirement, ResourceKey, ResourceType};
use crate::world::StructureKind;

/// What a completed recipe produces
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub enum RecipeOutput {
    Resource(ResourceType, u32),
    /// Item definition id and count
    Item(String, u32),
}

/// A crafting recipe
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Workstation that can execute this recipe
    pub workstation: StructureKind,
    /// Input materials reserved up front and consumed on completion
    pub inputs: Vec<MaterialRequirement>,
    /// Outputs produced on completion
    pub outputs: Vec<RecipeOutput>,
    /// Work units required per batch
    pub work_required: f32,
}

/// Catalog of all available recipes
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load default recipes (hardcoded so tests need no data files)
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(Recipe {
            id: "cook_meal".into(),
            name: "Cook Meal".into(),
            workstation: StructureKind::Stove,
            inputs: vec![MaterialRequirement::resource(ResourceType::RawFood, 2)],
            outputs: vec![RecipeOutput::Resource(ResourceType::Meal, 1)],
            work_required: 40.0,
        });

        catalog.add(Recipe {
            id: "cook_meat_stew".into(),
            name: "Cook Meat Stew".into(),
            workstation: StructureKind::Stove,
            inputs: vec![
                MaterialRequirement::tagged(&["meat"], 1),
                MaterialRequirement::resource(ResourceType::RawFood, 1),
            ],
            outputs: vec![RecipeOutput::Resource(ResourceType::Meal, 2)],
            work_required: 50.0,
        });

        catalog.add(Recipe {
            id: "smelt_metal".into(),
            name: "Smelt Metal".into(),
            workstation: StructureKind::SalvagersBench,
            inputs: vec![MaterialRequirement::resource(ResourceType::Scrap, 3)],
            outputs: vec![RecipeOutput::Resource(ResourceType::Metal, 1)],
            work_required: 50.0,
        });

        catalog.add(Recipe {
            id: "forge_scrap_knife".into(),
            name: "Forge Scrap Knife".into(),
            workstation: StructureKind::SalvagersBench,
            inputs: vec![
                MaterialRequirement::resource(ResourceType::Metal, 2),
                MaterialRequirement::resource(ResourceType::Scrap, 1),
            ],
            outputs: vec![RecipeOutput::Item("scrap_knife".into(), 1)],
            work_required: 60.0,
        });

        catalog.add(Recipe {
            id: "sew_work_gloves".into(),
            name: "Sew Work Gloves".into(),
            workstation: StructureKind::SalvagersBench,
            inputs: vec![MaterialRequirement::resource(ResourceType::Scrap, 2)],
            outputs: vec![RecipeOutput::Item("work_gloves".into(), 1)],
            work_required: 40.0,
        });

        catalog
    }

    /// Add a recipe to the catalog
    pub fn add(&mut self, recipe: Recipe) {
        self.recipes.push(recipe);
    }

    /// Get a recipe by ID
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Get all recipes for a specific workstation kind
    pub fn for_workstation(&self, kind: StructureKind) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter().filter(move |r| r.workstation == kind)
    }

    /// Get all recipes
    pub fn all(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Load recipes from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self, RecipeLoadError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RecipeLoadError::IoError(e.to_string()))?;
        Self::parse_toml(&content)
    }

    /// Parse recipes from TOML string
    pub fn parse_toml(content: &str) -> Result<Self, RecipeLoadError> {
        let toml_data: TomlRecipes =
            toml::from_str(content).map_err(|e| RecipeLoadError::ParseError(e.to_string()))?;

        let mut catalog = Self::new();
        for recipe in toml_data.recipes {
            catalog.add(recipe.into_recipe()?);
        }
        Ok(catalog)
    }
}

/// Error type for recipe loading
#[derive(Debug, Clone)]
pub enum RecipeLoadError {
    IoError(String),
    ParseError(String),
    InvalidWorkstation(String),
    InvalidResourceType(String),
    InvalidInput(String),
}

impl std::fmt::Display for RecipeLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeLoadError::IoError(e) => write!(f, "IO error: {}", e),
            RecipeLoadError::ParseError(e) => write!(f, "Parse error: {}", e),
            RecipeLoadError::InvalidWorkstation(e) => write!(f, "Invalid workstation: {}", e),
            RecipeLoadError::InvalidResourceType(e) => write!(f, "Invalid resource type: {}", e),
            RecipeLoadError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
        }
    }
}

impl std::error::Error for RecipeLoadError {}

/// TOML representation of the recipes file
#[derive(Debug, Deserialize)]
struct TomlRecipes {
    recipes: Vec<TomlRecipe>,
}

/// TOML representation of a single recipe
#[derive(Debug, Deserialize)]
struct TomlRecipe {
    id: String,
    name: String,
    workstation: String,
    #[serde(default)]
    inputs: Vec<TomlInput>,
    outputs: Vec<TomlOutput>,
    work_required: f32,
}

/// An input line: either a resource with amount, or a tag list with amount
#[derive(Debug, Deserialize)]
struct TomlInput {
    resource: Option<String>,
    tags: Option<Vec<String>>,
    amount: u32,
}

/// An output line: either a resource or an item definition id
#[derive(Debug, Deserialize)]
struct TomlOutput {
    resource: Option<String>,
    item: Option<String>,
    amount: u32,
}

impl TomlRecipe {
    fn into_recipe(self) -> Result<Recipe, RecipeLoadError> {
        let workstation = match self.workstation.to_lowercase().as_str() {
            "salvagers_bench" => StructureKind::SalvagersBench,
            "stove" => StructureKind::Stove,
            _ => return Err(RecipeLoadError::InvalidWorkstation(self.workstation)),
        };

        let inputs = self
            .inputs
            .into_iter()
            .map(TomlInput::into_requirement)
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = self
            .outputs
            .into_iter()
            .map(TomlOutput::into_output)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Recipe {
            id: self.id,
            name: self.name,
            workstation,
            inputs,
            outputs,
            work_required: self.work_required,
        })
    }
}

impl TomlInput {
    fn into_requirement(self) -> Result<MaterialRequirement, RecipeLoadError> {
        match (self.resource, self.tags) {
            (Some(resource), None) => {
                let resource = ResourceType::parse(&resource)
                    .ok_or(RecipeLoadError::InvalidResourceType(resource))?;
                Ok(MaterialRequirement {
                    key: ResourceKey::Resource(resource),
                    amount: self.amount,
                })
            }
            (None, Some(tags)) if !tags.is_empty() => Ok(MaterialRequirement {
                key: ResourceKey::Tagged(tags),
                amount: self.amount,
            }),
            _ => Err(RecipeLoadError::InvalidInput(
                "input needs exactly one of `resource` or non-empty `tags`".into(),
            )),
        }
    }
}

impl TomlOutput {
    fn into_output(self) -> Result<RecipeOutput, RecipeLoadError> {
        match (self.resource, self.item) {
            (Some(resource), None) => {
                let resource = ResourceType::parse(&resource)
                    .ok_or(RecipeLoadError::InvalidResourceType(resource))?;
                Ok(RecipeOutput::Resource(resource, self.amount))
            }
            (None, Some(item)) => Ok(RecipeOutput::Item(item, self.amount)),
            _ => Err(RecipeLoadError::InvalidInput(
                "output needs exactly one of `resource` or `item`".into(),
            )),
        }
    }
}
