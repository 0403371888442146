//! Hand-off of a finished design to manufacturing.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use verkove_core::{
    Dimensions, EntityKind, EntityStore, ManufacturingOrder, NewOrder, OrderSpecifications,
    OrderStatus, ProjectStatus, Specifications, StoreError,
};

use crate::StudioError;

const DEFAULT_FINISH: &str = "High Polish";
const DEFAULT_TIMELINE: &str = "3-4 weeks";
const DEFAULT_PRICE: f64 = 1500.0;

/// Placeholder identifiers for the files a workshop would receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLinks {
    pub specification_sheet: String,
    #[serde(rename = "model3D")]
    pub model_3d: String,
    pub renders: String,
}

impl DownloadLinks {
    fn for_order(order: &ManufacturingOrder) -> Self {
        Self {
            specification_sheet: format!("/downloads/orders/{}/specification-sheet.pdf", order.id),
            model_3d: format!("/downloads/orders/{}/model.stl", order.id),
            renders: format!("/downloads/orders/{}/renders.zip", order.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub order: ManufacturingOrder,
    pub download_links: DownloadLinks,
}

fn default_specifications() -> Specifications {
    Specifications {
        materials: vec!["Gold".to_string()],
        dimensions: Dimensions {
            width: "10mm".to_string(),
            height: "10mm".to_string(),
            depth: "5mm".to_string(),
        },
        weight: "5g".to_string(),
    }
}

/// Materials, dimensions and weight come from the base design; the rest is
/// fixed.
pub fn order_specifications(base: Option<&Specifications>) -> OrderSpecifications {
    let spec = base.cloned().unwrap_or_else(default_specifications);
    OrderSpecifications {
        materials: spec.materials,
        dimensions: spec.dimensions,
        weight: spec.weight,
        finish: DEFAULT_FINISH.to_string(),
        timeline: DEFAULT_TIMELINE.to_string(),
        price: DEFAULT_PRICE,
    }
}

pub struct ManufacturingExport {
    store: Arc<EntityStore>,
}

impl ManufacturingExport {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Create a pending order for the project and move it to `manufacturing`.
    /// Exporting again creates another order.
    pub fn export(&self, project_id: u64) -> Result<ExportResult, StudioError> {
        let project = self.store.project(project_id).ok_or(StoreError::NotFound {
            kind: EntityKind::Project,
            id: project_id,
        })?;

        let base_spec = project
            .base_design_id
            .and_then(|id| self.store.base_design(id))
            .and_then(|b| b.specifications);

        // Status first: an order must never reference a missing project.
        let project = self
            .store
            .set_project_status(project_id, ProjectStatus::Manufacturing)?;

        let order = self.store.create_order(NewOrder {
            project_id: project.id,
            specifications: order_specifications(base_spec.as_ref()),
            status: OrderStatus::Pending,
        });

        info!(
            project_id,
            order_id = order.id,
            materials = ?order.specifications.materials,
            "design exported for manufacturing"
        );

        Ok(ExportResult {
            download_links: DownloadLinks::for_order(&order),
            order,
        })
    }
}
