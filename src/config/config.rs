use std::env;
use std::path::PathBuf;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono_tz::Tz;

use crate::error::{AttendanceError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://tu-app.koyeb.app";

/// AES-128 key and IV for the token kept on disk.
#[derive(Clone)]
pub struct SessionKey {
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub session_key: Option<SessionKey>,
    pub log_dir: PathBuf,
    pub request_timeout: Duration,
    pub location_timeout: Duration,
    pub jpeg_quality: u8,
    pub require_photo: bool,
    pub display_tz: Tz,
    pub camera_source: Option<PathBuf>,
    pub location_file: Option<PathBuf>,
    pub fixed_location: Option<(f64, f64)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_path: PathBuf::from(".pedia_session.json"),
            session_key: None,
            log_dir: PathBuf::from("logs"),
            request_timeout: Duration::from_secs(30),
            location_timeout: Duration::from_secs(10),
            jpeg_quality: 85,
            require_photo: false,
            display_tz: chrono_tz::America::Lima,
            camera_source: None,
            location_file: None,
            fixed_location: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Config::default();

        if let Some(url) = get("API_BASE_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = get("SESSION_PATH") {
            config.session_path = PathBuf::from(path);
        }
        if let Some(dir) = get("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        config.session_key = match (get("SESSION_AES_KEY"), get("SESSION_AES_IV")) {
            (Some(key_b64), Some(iv_b64)) => {
                let key = decode_b64("SESSION_AES_KEY", &key_b64)?;
                let iv = decode_b64("SESSION_AES_IV", &iv_b64)?;
                if key.len() != 16 || iv.len() != 16 {
                    return Err(AttendanceError::Config(
                        "SESSION_AES_KEY y SESSION_AES_IV deben tener 16 bytes".to_string(),
                    ));
                }
                Some(SessionKey { key, iv })
            }
            (None, None) => None,
            _ => {
                return Err(AttendanceError::Config(
                    "SESSION_AES_KEY y SESSION_AES_IV deben configurarse juntos".to_string(),
                ));
            }
        };

        if let Some(raw) = get("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_timeout("REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = get("LOCATION_TIMEOUT_SECS") {
            config.location_timeout = parse_timeout("LOCATION_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = get("JPEG_QUALITY") {
            let quality: u32 = parse_number("JPEG_QUALITY", &raw)?;
            config.jpeg_quality = quality.clamp(1, 100) as u8;
        }
        if let Some(raw) = get("REQUIRE_PHOTO") {
            config.require_photo = parse_flag("REQUIRE_PHOTO", &raw)?;
        }
        if let Some(raw) = get("DISPLAY_TZ") {
            config.display_tz = raw
                .parse::<Tz>()
                .map_err(|e| AttendanceError::Config(format!("DISPLAY_TZ inválido: {}", e)))?;
        }

        config.camera_source = get("CAMERA_SOURCE").map(PathBuf::from);
        config.location_file = get("LOCATION_FILE").map(PathBuf::from);
        config.fixed_location = match (get("LOCATION_LATITUDE"), get("LOCATION_LONGITUDE")) {
            (Some(lat), Some(lng)) => Some((
                parse_number("LOCATION_LATITUDE", &lat)?,
                parse_number("LOCATION_LONGITUDE", &lng)?,
            )),
            _ => None,
        };

        Ok(config)
    }
}

fn decode_b64(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| AttendanceError::Config(format!("{} mal codificado: {}", name, e)))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| AttendanceError::Config(format!("{} inválido ({}): {}", name, value, e)))
}

fn parse_timeout(name: &str, value: &str) -> Result<Duration> {
    match parse_number::<u64>(name, value)? {
        0 => Err(AttendanceError::Config(format!("{} debe ser mayor que 0", name))),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "sí" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(AttendanceError::Config(format!("{} inválido: {}", name, value))),
    }
}
