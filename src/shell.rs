use tracing::{info, warn};

use crate::checkin::{AttendanceSubmitter, CheckinFlow};
use crate::client::ApiClient;
use crate::client::admin::models::{AttendanceRecord, ExportSummary};
use crate::client::admin::services::{export_attendance, list_attendance};
use crate::client::auth::models::LoginRequest;
use crate::client::auth::services::login;
use crate::config::Config;
use crate::device::{
    CameraCapture, CameraDevice, FileCamera, FileLocation, FixedLocation, LocationProvider, LocationSource, NoCamera,
    NoLocation,
};
use crate::error::{AttendanceError, Result};
use crate::session::{Role, Session, SessionStore, TokenCipher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    StudentDashboard,
    AdminDashboard,
}

impl Screen {
    pub fn for_session(session: Option<&Session>) -> Self {
        match session.map(|s| s.role) {
            Some(Role::Student) => Screen::StudentDashboard,
            Some(Role::Admin) => Screen::AdminDashboard,
            None => Screen::Login,
        }
    }
}

pub struct AppShell {
    config: Config,
    api: ApiClient,
    store: SessionStore,
    session: Option<Session>,
    login_error: Option<String>,
}

impl AppShell {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let cipher = config.session_key.clone().map(TokenCipher::new);
        let store = SessionStore::new(&config.session_path, cipher);
        Ok(Self::with_parts(config, api, store))
    }

    /// The persisted session decides the first screen.
    pub fn with_parts(config: Config, api: ApiClient, store: SessionStore) -> Self {
        let session = store.load();
        info!(screen = ?Screen::for_session(session.as_ref()), "pantalla inicial");
        Self {
            config,
            api,
            store,
            session,
            login_error: None,
        }
    }

    pub fn screen(&self) -> Screen {
        Screen::for_session(self.session.as_ref())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    /// Any previous session is discarded before the credentials are sent, so a
    /// rejected login always ends on the login screen.
    pub async fn login(&mut self, phone: &str, password: &str) -> Result<Screen> {
        let request = LoginRequest {
            phone: phone.to_string(),
            password: password.to_string(),
        };
        if self.session.take().is_some() {
            info!("sesión anterior descartada");
        }
        let outcome = match self.store.clear() {
            Ok(()) => match login(&self.api, &request).await {
                Ok(session) => self.store.save(&session).map(|_| session),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(session) => {
                self.login_error = None;
                self.session = Some(session);
                Ok(self.screen())
            }
            Err(e) => {
                self.login_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Always ends on the login screen, even if the session file could not be removed.
    pub fn logout(&mut self) -> Result<()> {
        self.session = None;
        self.login_error = None;
        let cleared = self.store.clear();
        if let Err(e) = &cleared {
            warn!(error = %e, "no se pudo borrar la sesión");
        }
        info!("sesión cerrada");
        cleared
    }

    fn require(&self, role: Role) -> Result<&Session> {
        match &self.session {
            Some(session) if session.role == role => Ok(session),
            Some(_) => Err(AttendanceError::Validation("Opción no disponible para este usuario".to_string())),
            None => Err(AttendanceError::Validation("Debe iniciar sesión".to_string())),
        }
    }

    pub fn checkin_flow(&self) -> Result<CheckinFlow> {
        let (camera, location) = devices_from_config(&self.config);
        self.checkin_flow_with(camera, location)
    }

    pub fn checkin_flow_with(
        &self,
        camera: Box<dyn CameraDevice>,
        location: Box<dyn LocationSource>,
    ) -> Result<CheckinFlow> {
        let session = self.require(Role::Student)?.clone();
        Ok(CheckinFlow::new(
            session,
            CameraCapture::new(camera, self.config.jpeg_quality),
            LocationProvider::new(location, self.config.location_timeout),
            AttendanceSubmitter::new(self.api.clone(), self.config.require_photo),
        ))
    }

    pub async fn attendance_list(&self) -> Result<Vec<AttendanceRecord>> {
        let session = self.require(Role::Admin)?;
        list_attendance(&self.api, &session.token).await
    }

    pub async fn export(&self) -> Result<ExportSummary> {
        let session = self.require(Role::Admin)?;
        export_attendance(&self.api, &session.token).await
    }
}

pub fn devices_from_config(config: &Config) -> (Box<dyn CameraDevice>, Box<dyn LocationSource>) {
    let camera: Box<dyn CameraDevice> = match &config.camera_source {
        Some(path) => Box::new(FileCamera::new(path)),
        None => Box::new(NoCamera),
    };
    let location: Box<dyn LocationSource> = match (config.fixed_location, &config.location_file) {
        (Some((latitude, longitude)), _) => Box::new(FixedLocation { latitude, longitude }),
        (None, Some(path)) => Box::new(FileLocation::new(path)),
        (None, None) => Box::new(NoLocation),
    };
    (camera, location)
}
