pub mod catalog;
mod error;
pub mod images;
pub mod settings;
pub mod store;

pub use error::{EntityKind, StoreError};
pub use images::ImageStore;
pub use settings::{ai_configured, AiSettings};
pub use store::EntityStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

// --- Catalog types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Rings,
    Necklaces,
    Earrings,
    Bracelets,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Rings => "rings",
            Category::Necklaces => "necklaces",
            Category::Earrings => "earrings",
            Category::Bracelets => "bracelets",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubDesignKind {
    Enhancement,
    Modification,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Dimensions {
    #[serde(default)]
    pub width: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub depth: String,
}

/// Physical description of a piece. Every field is optional on the wire so a
/// client may send `{}` for "no specifications yet".
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Specifications {
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub weight: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaseDesign {
    pub id: u64,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Specifications>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBaseDesign {
    pub name: String,
    pub category: Category,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub specifications: Option<Specifications>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubDesign {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubDesignKind,
    pub description: String,
    pub icon_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubDesign {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubDesignKind,
    pub description: String,
    pub icon_name: String,
}

// --- Project types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Final,
    Manufacturing,
}

/// The "latest" view of a project: what the workspace currently shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDesignData {
    pub image_url: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Specifications>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    /// Image attached to the turn: the user's reference or a generated design
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One generation result. `prompt` is always the literal user text, never the
/// enriched directive sent to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignIteration {
    pub id: String,
    pub image_url: String,
    pub prompt: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub ai_response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignProject {
    pub id: u64,
    pub name: String,
    pub base_design_id: Option<u64>,
    pub current_design_data: Option<CurrentDesignData>,
    pub chat_history: Vec<ChatMessage>,
    pub design_iterations: Vec<DesignIteration>,
    pub selected_sub_designs: BTreeSet<u64>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub base_design_id: Option<u64>,
    #[serde(default)]
    pub current_design_data: Option<CurrentDesignData>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub design_iterations: Vec<DesignIteration>,
    #[serde(default)]
    pub selected_sub_designs: BTreeSet<u64>,
    #[serde(default)]
    pub status: ProjectStatus,
}

/// Shallow partial update. A present list replaces the stored list wholesale.
/// Server-owned fields (`id`, `createdAt`, `updatedAt`) are ignored if sent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub base_design_id: Option<u64>,
    #[serde(default)]
    pub current_design_data: Option<CurrentDesignData>,
    #[serde(default)]
    pub chat_history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub design_iterations: Option<Vec<DesignIteration>>,
    #[serde(default)]
    pub selected_sub_designs: Option<BTreeSet<u64>>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    pub fn apply(self, project: &mut DesignProject) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(id) = self.base_design_id {
            project.base_design_id = Some(id);
        }
        if let Some(data) = self.current_design_data {
            project.current_design_data = Some(data);
        }
        if let Some(history) = self.chat_history {
            project.chat_history = history;
        }
        if let Some(iterations) = self.design_iterations {
            project.design_iterations = iterations;
        }
        if let Some(selected) = self.selected_sub_designs {
            project.selected_sub_designs = selected;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
    }
}

// --- Manufacturing types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Manufacturing,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSpecifications {
    pub materials: Vec<String>,
    pub dimensions: Dimensions,
    pub weight: String,
    pub finish: String,
    pub timeline: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingOrder {
    pub id: u64,
    pub project_id: u64,
    pub specifications: OrderSpecifications,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub project_id: u64,
    pub specifications: OrderSpecifications,
    #[serde(default)]
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub specifications: Option<OrderSpecifications>,
}

// --- Storage ---

/// Resolve the data directory: `$VERKOVE_DATA_DIR`, else `~/.verkove/`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("VERKOVE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".verkove")
}
