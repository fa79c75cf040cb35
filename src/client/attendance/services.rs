use tracing::{debug, info};

use crate::client::ApiClient;
use crate::client::api::{ensure_success, send};
use crate::client::attendance::models::{CheckinReceipt, CheckinRequest};
use crate::error::Result;

pub async fn checkin(api: &ApiClient, token: &str, request: &CheckinRequest) -> Result<CheckinReceipt> {
    debug!(
        latitude = request.latitude,
        longitude = request.longitude,
        with_photo = request.photo_base64.is_some(),
        "enviando asistencia"
    );
    let res = send(api.post("/attendance/checkin", Some(token))?.json(request)).await?;
    let res = ensure_success(res).await?;
    let status = res.status();

    // The body is not part of the contract; keep whatever parses.
    let receipt = match res.bytes().await {
        Ok(body) => serde_json::from_slice(&body).unwrap_or_default(),
        Err(_) => CheckinReceipt::default(),
    };
    info!(%status, id = ?receipt.id, "asistencia registrada");
    Ok(receipt)
}
