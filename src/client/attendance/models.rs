use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckinRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// JPEG bytes, base64 without a data-URL prefix. Sent as `null` when absent.
    pub photo_base64: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckinReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}
