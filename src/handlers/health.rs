use axum::Json;
use serde_json::{Value, json};

/// Liveness probe. Workers only start serving after their database pool
/// and image directory are ready, so answering at all means ready.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "liveness",
    summary = "Liveness probe",
    responses((status = 200, description = "Worker is up and ready")),
)]
pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
