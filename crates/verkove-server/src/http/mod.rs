pub(crate) mod catalog;
pub(crate) mod projects;
pub(crate) mod request_log;
pub(crate) mod studio;
pub(crate) mod uploads;

use axum::Json;
use serde_json::{json, Value};

pub(crate) async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
