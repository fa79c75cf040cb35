use reqwest::StatusCode;
use thiserror::Error;

use crate::device::location::LocationFailure;

pub type Result<T> = std::result::Result<T, AttendanceError>;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("connectivity error: {0}")]
    Connectivity(#[source] reqwest::Error),

    #[error("server rejected request ({status}): {detail}")]
    ServerRejected { status: StatusCode, detail: String },

    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("camera is not streaming")]
    CameraNotStreaming,

    #[error("photo encoding failed: {0}")]
    PhotoEncoding(String),

    #[error("location unavailable: {0}")]
    LocationUnavailable(#[from] LocationFailure),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AttendanceError {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationFailed(detail) => detail.clone(),
            Self::Connectivity(_) => "Error de conexión".to_string(),
            Self::ServerRejected { detail, .. } => format!("Error: {}", detail),
            Self::CameraUnavailable(_) => "No se pudo acceder a la cámara".to_string(),
            Self::CameraNotStreaming => "La cámara no está activa".to_string(),
            Self::PhotoEncoding(detail) => format!("No se pudo procesar la foto: {}", detail),
            Self::LocationUnavailable(failure) => format!("Error: {}", failure),
            Self::Validation(message) => message.clone(),
            Self::UnexpectedResponse(_) => "Respuesta inesperada del servidor".to_string(),
            Self::Storage(detail) => format!("Error al guardar la sesión: {}", detail),
            Self::Config(detail) => format!("Error de configuración: {}", detail),
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}
