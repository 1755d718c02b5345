use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use super::error::ApiResult;
use super::state::AppState;
use crate::domain::events::{DomainEvent, ExportEvent};
use crate::export::{CsvExport, ExportableRecord};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/exports/csv", post(export_csv))
}

/// Body of a client-side table export. A missing `records` field counts as empty.
#[derive(Debug, Deserialize, Validate)]
pub struct CsvExportRequest {
    #[validate(length(max = 120))]
    pub filename: String,
    #[serde(default)]
    pub records: Vec<ExportableRecord>,
}

async fn export_csv(State(s): State<AppState>, payload: Result<Json<CsvExportRequest>, JsonRejection>) -> ApiResult<Response> {
    let Json(r) = payload?;
    r.validate()?;
    let export = s.exporter.export_today(&r.records, &r.filename)?;
    Ok(deliver(&s, export).await)
}

/// Announces the export and wraps it as a `text/csv` attachment.
pub(crate) async fn deliver(s: &AppState, export: CsvExport) -> Response {
    tracing::info!(filename = %export.filename, rows = export.rows, "csv export generated");
    s.publisher
        .publish(&DomainEvent::Export(ExportEvent::Generated { filename: export.filename.clone(), rows: export.rows }))
        .await;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    (
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response()
}
