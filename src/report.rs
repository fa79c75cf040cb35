use std::path::Path;

use chrono_tz::Tz;

use crate::client::admin::models::{AttendanceRecord, ExportSummary};
use crate::error::{AttendanceError, Result};

const TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub fn render_attendance_list(records: &[AttendanceRecord], tz: Tz) -> String {
    if records.is_empty() {
        return "No hay registros de asistencia".to_string();
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&format!("Usuario: {}\n", record.user_id));
        out.push_str(&format!(
            "Ubicación: {:.6}, {:.6}\n",
            record.latitude, record.longitude
        ));
        out.push_str(&format!(
            "{}\n",
            record.created_at.with_timezone(&tz).format(TIME_FORMAT)
        ));
        if let Some(photo) = record.photo() {
            out.push_str(&format!("Foto: {}\n", photo));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn render_export(summary: &ExportSummary) -> String {
    match &summary.pdf_url {
        Some(url) if !url.is_empty() => format!("PDF generado: {} registros ({})", summary.count, url),
        _ => format!("PDF generado: {} registros", summary.count),
    }
}

pub fn write_records_csv<P: AsRef<Path>>(records: &[AttendanceRecord], path: P, tz: Tz) -> Result<()> {
    let path = path.as_ref();
    let to_storage = |e: csv::Error| AttendanceError::Storage(format!("{}: {}", path.display(), e));

    let mut writer = csv::Writer::from_path(path).map_err(to_storage)?;
    writer
        .write_record(["id", "user_id", "latitude", "longitude", "created_at", "status", "photo_url"])
        .map_err(to_storage)?;
    for record in records {
        writer
            .write_record([
                record.id.clone().unwrap_or_default(),
                record.user_id.clone(),
                format!("{:.6}", record.latitude),
                format!("{:.6}", record.longitude),
                record.created_at.with_timezone(&tz).to_rfc3339(),
                record.status.clone().unwrap_or_default(),
                record.photo().unwrap_or_default().to_string(),
            ])
            .map_err(to_storage)?;
    }
    writer
        .flush()
        .map_err(|e| AttendanceError::Storage(format!("{}: {}", path.display(), e)))
}
