use tracing::info;

use crate::client::ApiClient;
use crate::client::admin::models::{AttendanceRecord, ExportSummary};
use crate::client::api::{ensure_success, read_json, send};
use crate::error::Result;

pub async fn list_attendance(api: &ApiClient, token: &str) -> Result<Vec<AttendanceRecord>> {
    let res = ensure_success(send(api.get("/admin/list", token)?).await?).await?;
    let records: Vec<AttendanceRecord> = read_json(res).await?;
    info!(count = records.len(), "registros de asistencia obtenidos");
    Ok(records)
}

pub async fn export_attendance(api: &ApiClient, token: &str) -> Result<ExportSummary> {
    let res = ensure_success(send(api.get("/admin/export", token)?).await?).await?;
    let summary: ExportSummary = read_json(res).await?;
    info!(count = summary.count, "exportación solicitada");
    Ok(summary)
}
