use aes::Aes128;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use block_modes::{BlockMode, Cbc};
use block_padding::Pkcs7;

use crate::config::SessionKey;
use crate::error::{AttendanceError, Result};

type Aes128Cbc = Cbc<Aes128, Pkcs7>;

/// Encrypts the session token with AES-128-CBC before it is written to disk.
#[derive(Debug, Clone)]
pub struct TokenCipher {
    key: SessionKey,
}

impl TokenCipher {
    pub fn new(key: SessionKey) -> Self {
        Self { key }
    }

    fn cipher(&self) -> Result<Aes128Cbc> {
        Aes128Cbc::new_from_slices(&self.key.key, &self.key.iv)
            .map_err(|e| AttendanceError::Config(format!("Error creando el cifrador: {}", e)))
    }

    pub fn encrypt(&self, token: &str) -> Result<String> {
        let ciphertext = self.cipher()?.encrypt_vec(token.as_bytes());
        Ok(STANDARD.encode(ciphertext))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let ciphertext = STANDARD
            .decode(encoded)
            .map_err(|e| AttendanceError::Storage(format!("Token mal codificado: {}", e)))?;
        let plain = self
            .cipher()?
            .decrypt_vec(&ciphertext)
            .map_err(|e| AttendanceError::Storage(format!("Error al descifrar: {}", e)))?;
        String::from_utf8(plain)
            .map_err(|_| AttendanceError::Storage("Token descifrado no es UTF-8".to_string()))
    }
}
