//! Stage status endpoint.

use axum::Json;
use serde::Serialize;

use crate::pipeline::Stage;

#[derive(Debug, Serialize)]
pub struct StageStatus {
    pub stage: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn get_status(stage: Stage) -> Json<StageStatus> {
    Json(StageStatus {
        stage: stage.as_str(),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}
