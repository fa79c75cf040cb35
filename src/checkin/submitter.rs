use tracing::warn;

use crate::client::ApiClient;
use crate::client::attendance::models::{CheckinReceipt, CheckinRequest};
use crate::client::attendance::services::checkin;
use crate::device::{CapturedImage, LocationFix};
use crate::error::{AttendanceError, Result};
use crate::session::Session;

pub const MISSING_LOCATION: &str = "No se pudo obtener la ubicación";
pub const MISSING_PHOTO: &str = "Debe capturar una foto antes de registrar la asistencia";

#[derive(Debug, Clone)]
pub struct AttendanceSubmitter {
    api: ApiClient,
    require_photo: bool,
}

impl AttendanceSubmitter {
    pub fn new(api: ApiClient, require_photo: bool) -> Self {
        Self { api, require_photo }
    }

    /// Preconditions are checked before any request is built.
    pub fn build_request(&self, fix: Option<&LocationFix>, image: Option<&CapturedImage>) -> Result<CheckinRequest> {
        let fix = fix.ok_or_else(|| AttendanceError::Validation(MISSING_LOCATION.to_string()))?;
        if image.is_none() {
            if self.require_photo {
                return Err(AttendanceError::Validation(MISSING_PHOTO.to_string()));
            }
            warn!("registrando asistencia sin foto");
        }
        Ok(CheckinRequest {
            latitude: fix.latitude,
            longitude: fix.longitude,
            photo_base64: image.map(CapturedImage::to_base64),
        })
    }

    pub async fn submit(
        &self,
        fix: Option<&LocationFix>,
        image: Option<&CapturedImage>,
        session: &Session,
    ) -> Result<CheckinReceipt> {
        let request = self.build_request(fix, image)?;
        checkin(&self.api, &session.token, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn submitter(require_photo: bool) -> AttendanceSubmitter {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        AttendanceSubmitter::new(api, require_photo)
    }

    fn image() -> CapturedImage {
        CapturedImage {
            encoded: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn request_carries_coordinates_and_base64_photo() {
        let fix = LocationFix::new(10.0, 20.0);
        let request = submitter(false).build_request(Some(&fix), Some(&image())).unwrap();
        assert_eq!(request.latitude, 10.0);
        assert_eq!(request.longitude, 20.0);
        assert_eq!(request.photo_base64.as_deref(), Some("/9j/2Q=="));
    }

    #[test]
    fn photo_is_sent_as_null_when_missing() {
        let fix = LocationFix::new(1.0, 2.0);
        let request = submitter(false).build_request(Some(&fix), None).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["photo_base64"].is_null());
    }

    #[test]
    fn photo_can_be_required() {
        let fix = LocationFix::new(1.0, 2.0);
        let err = submitter(true).build_request(Some(&fix), None).unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(ref m) if m == MISSING_PHOTO));
    }

    #[tokio::test]
    async fn missing_fix_fails_locally() {
        let session = Session {
            token: "abc".to_string(),
            role: crate::session::Role::Student,
        };
        // Port 9 is never contacted: a network attempt would surface as Connectivity.
        let err = submitter(false).submit(None, Some(&image()), &session).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(ref m) if m == MISSING_LOCATION));
    }
}
