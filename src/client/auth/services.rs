use tracing::{info, warn};

use crate::client::ApiClient;
use crate::client::api::{read_detail, read_json, send};
use crate::client::auth::models::{LoginRequest, LoginResponse};
use crate::error::{AttendanceError, Result};
use crate::session::{Role, Session};

pub async fn login(api: &ApiClient, request: &LoginRequest) -> Result<Session> {
    let res = send(api.post("/auth/login", None)?.json(request)).await?;
    let status = res.status();

    if !status.is_success() {
        let detail = read_detail(res)
            .await
            .unwrap_or_else(|| "Error de autenticación".to_string());
        warn!(phone = %request.phone, %status, "login rechazado");
        return Err(AttendanceError::AuthenticationFailed(detail));
    }

    let body: LoginResponse = read_json(res).await?;
    if body.access_token.is_empty() {
        return Err(AttendanceError::UnexpectedResponse("token vacío".to_string()));
    }
    if let Some(kind) = body.token_type.as_deref() {
        if !kind.eq_ignore_ascii_case("bearer") {
            warn!(token_type = kind, "tipo de token inesperado");
        }
    }
    let role = Role::parse(&body.user_type).ok_or_else(|| {
        AttendanceError::UnexpectedResponse(format!("tipo de usuario desconocido: {}", body.user_type))
    })?;

    info!(phone = %request.phone, %role, "login correcto");
    Ok(Session {
        token: body.access_token,
        role,
    })
}
