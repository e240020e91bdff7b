//! Resource kinds, item definitions, and tag matching
//!
//! Fungible resources stack in stockpile cells; discrete items carry tag
//! sets used for filtering and for generic recipe inputs ("any meat").

use serde::{Deserialize, Serialize};

use crate::core::types::ItemId;

/// Fungible resource kinds that stack in stockpile cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Wood,
    Stone,
    Scrap,
    Metal,
    Power,
    RawFood,
    Meal,
}

impl ResourceType {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Wood => "wood",
            ResourceType::Stone => "stone",
            ResourceType::Scrap => "scrap",
            ResourceType::Metal => "metal",
            ResourceType::Power => "power",
            ResourceType::RawFood => "raw_food",
            ResourceType::Meal => "meal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "wood" => Some(ResourceType::Wood),
            "stone" => Some(ResourceType::Stone),
            "scrap" => Some(ResourceType::Scrap),
            "metal" => Some(ResourceType::Metal),
            "power" => Some(ResourceType::Power),
            "raw_food" => Some(ResourceType::RawFood),
            "meal" => Some(ResourceType::Meal),
            _ => None,
        }
    }
}

/// Item capability tag ("equipment", "weapon", "meat", ...)
pub type Tag = String;

/// Static definition of a discrete item kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub tags: Vec<Tag>,
}

/// A concrete item in the world or in storage
///
/// Tags are denormalized from the definition so storage filters and
/// reservations can match without a catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    pub id: ItemId,
    pub def_id: String,
    pub tags: Vec<Tag>,
}

impl ItemInstance {
    pub fn of(def: &ItemDef) -> Self {
        Self {
            id: ItemId::new(),
            def_id: def.id.clone(),
            tags: def.tags.clone(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Superset check: every required tag must be present on the item
pub fn matches_tags(required: &[Tag], item_tags: &[Tag]) -> bool {
    required
        .iter()
        .all(|req| item_tags.iter().any(|t| t == req))
}

/// What a recipe input or reservation request identifies: a specific
/// fungible resource, or any item carrying all of the given tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceKey {
    Resource(ResourceType),
    Tagged(Vec<Tag>),
}

impl ResourceKey {
    pub fn tagged(tags: &[&str]) -> Self {
        ResourceKey::Tagged(tags.iter().map(|t| (*t).to_string()).collect())
    }

    pub fn matches_item(&self, item: &ItemInstance) -> bool {
        match self {
            ResourceKey::Resource(_) => false,
            ResourceKey::Tagged(required) => matches_tags(required, &item.tags),
        }
    }
}

/// One line of a recipe or blueprint bill of materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub key: ResourceKey,
    pub amount: u32,
}

impl MaterialRequirement {
    pub fn resource(resource: ResourceType, amount: u32) -> Self {
        Self {
            key: ResourceKey::Resource(resource),
            amount,
        }
    }

    pub fn tagged(tags: &[&str], amount: u32) -> Self {
        Self {
            key: ResourceKey::tagged(tags),
            amount,
        }
    }
}

/// Catalog of all known item definitions
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    defs: Vec<ItemDef>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the default item set
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.register(ItemDef {
            id: "scrap_knife".into(),
            name: "Scrap Knife".into(),
            tags: vec!["equipment".into(), "weapon".into()],
        });
        catalog.register(ItemDef {
            id: "work_gloves".into(),
            name: "Work Gloves".into(),
            tags: vec!["equipment".into(), "clothing".into(), "work".into()],
        });
        catalog.register(ItemDef {
            id: "patch_coat".into(),
            name: "Patchwork Coat".into(),
            tags: vec!["equipment".into(), "clothing".into()],
        });
        catalog.register(ItemDef {
            id: "raw_meat".into(),
            name: "Raw Meat".into(),
            tags: vec!["food".into(), "meat".into()],
        });

        catalog
    }

    pub fn register(&mut self, def: ItemDef) {
        self.defs.push(def);
    }

    pub fn get(&self, id: &str) -> Option<&ItemDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    pub fn with_tag(&self, tag: &str) -> impl Iterator<Item = &ItemDef> + '_ {
        let tag = tag.to_string();
        self.defs.iter().filter(move |d| d.tags.iter().any(|t| *t == tag))
    }

    pub fn spawn(&self, id: &str) -> Option<ItemInstance> {
        self.get(id).map(ItemInstance::of)
    }

    pub fn all(&self) -> &[ItemDef] {
        &self.defs
    }
}
