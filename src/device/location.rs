use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            captured_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationFailure {
    #[error("permiso de ubicación denegado")]
    PermissionDenied,
    #[error("tiempo de espera agotado al obtener la ubicación")]
    Timeout,
    #[error("ubicación no disponible: {0}")]
    PositionUnavailable(String),
    #[error("Geolocalización no soportada")]
    Unsupported,
}

/// A device able to answer a single position query.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<(f64, f64), LocationFailure>;
}

/// Fixed coordinates, e.g. the site of a kiosk terminal.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<(f64, f64), LocationFailure> {
        Ok((self.latitude, self.longitude))
    }
}

#[derive(Debug, Deserialize)]
struct PositionFile {
    latitude: f64,
    longitude: f64,
}

/// Reads `{"latitude": .., "longitude": ..}` written by an external GPS helper.
#[derive(Debug, Clone)]
pub struct FileLocation {
    path: PathBuf,
}

impl FileLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LocationSource for FileLocation {
    async fn current_position(&self) -> Result<(f64, f64), LocationFailure> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => LocationFailure::PermissionDenied,
                _ => LocationFailure::PositionUnavailable(format!("{}: {}", self.path.display(), e)),
            })?;
        let position: PositionFile = serde_json::from_str(&data)
            .map_err(|e| LocationFailure::PositionUnavailable(e.to_string()))?;
        Ok((position.latitude, position.longitude))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationSource for NoLocation {
    async fn current_position(&self) -> Result<(f64, f64), LocationFailure> {
        Err(LocationFailure::Unsupported)
    }
}

pub struct LocationProvider {
    source: Box<dyn LocationSource>,
    timeout: Duration,
    last_fix: Option<LocationFix>,
}

impl LocationProvider {
    pub fn new(source: Box<dyn LocationSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            last_fix: None,
        }
    }

    /// One query, no retry. `&mut self` keeps it to a single outstanding request.
    pub async fn request_once(&mut self) -> Result<LocationFix, LocationFailure> {
        let result = match tokio::time::timeout(self.timeout, self.source.current_position()).await {
            Ok(result) => result,
            Err(_) => Err(LocationFailure::Timeout),
        };

        match result.and_then(|(lat, lng)| validate(lat, lng)) {
            Ok(fix) => {
                info!(latitude = fix.latitude, longitude = fix.longitude, "ubicación obtenida");
                self.last_fix = Some(fix);
                Ok(fix)
            }
            Err(failure) => {
                warn!(reason = %failure, "no se pudo obtener la ubicación");
                Err(failure)
            }
        }
    }

    /// Latest good fix. A failed query leaves it untouched.
    pub fn last_fix(&self) -> Option<&LocationFix> {
        self.last_fix.as_ref()
    }
}

fn validate(latitude: f64, longitude: f64) -> Result<LocationFix, LocationFailure> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(LocationFailure::PositionUnavailable(format!("latitud inválida {}", latitude)));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(LocationFailure::PositionUnavailable(format!("longitud inválida {}", longitude)));
    }
    Ok(LocationFix::new(latitude, longitude))
}

/// Status line shown on the student dashboard.
pub fn render_status(result: Option<&Result<LocationFix, LocationFailure>>) -> String {
    match result {
        None => "📍 Obteniendo ubicación...".to_string(),
        Some(Ok(fix)) => format!("✅ Ubicación: {:.6}, {:.6}", fix.latitude, fix.longitude),
        Some(Err(LocationFailure::Unsupported)) => "❌ Geolocalización no soportada".to_string(),
        Some(Err(failure)) => format!("❌ Error: {}", failure),
    }
}
