use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthStatus {
    status: &'static str,
    message: &'static str,
}

pub async fn handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK",
        message: "Server is running",
    })
}
