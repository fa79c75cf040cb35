use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct LoginRequest {
    /// Phone number or e-mail; the server accepts either.
    pub phone: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("phone", &self.phone)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_type: String,
    #[serde(default)]
    pub token_type: Option<String>,
}
