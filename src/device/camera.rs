use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat, RgbImage};
use tracing::{debug, info, warn};

use crate::error::{AttendanceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Rear camera.
    Environment,
    User,
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>>;
}

/// A live camera feed. `release` consumes the handle, so a stream can only be
/// released once.
pub trait CameraStream: Send {
    fn grab_frame(&mut self) -> Result<RgbImage>;
    fn release(self: Box<Self>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub encoded: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    pub fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.encoded)
    }
}

enum CameraState {
    Idle,
    Streaming(Box<dyn CameraStream>),
}

pub struct CameraCapture {
    device: Box<dyn CameraDevice>,
    state: CameraState,
    jpeg_quality: u8,
}

impl CameraCapture {
    pub fn new(device: Box<dyn CameraDevice>, jpeg_quality: u8) -> Self {
        Self {
            device,
            state: CameraState::Idle,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.state, CameraState::Streaming(_))
    }

    /// Opens the rear camera, or the front one when there is no rear camera.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_streaming() {
            debug!("la cámara ya está activa");
            return Ok(());
        }
        let stream = match self.device.open(Facing::Environment).await {
            Ok(stream) => stream,
            Err(e) => {
                debug!(error = %e, "cámara trasera no disponible, probando la frontal");
                self.device.open(Facing::User).await.map_err(|e| {
                    warn!(error = %e, "no se pudo acceder a la cámara");
                    e
                })?
            }
        };
        self.state = CameraState::Streaming(stream);
        info!("cámara iniciada");
        Ok(())
    }

    /// Freezes the current frame. The stream is released before encoding and
    /// also when grabbing the frame fails.
    pub fn freeze(&mut self) -> Result<CapturedImage> {
        let CameraState::Streaming(mut stream) = std::mem::replace(&mut self.state, CameraState::Idle)
        else {
            return Err(AttendanceError::CameraNotStreaming);
        };

        let frame = stream.grab_frame();
        stream.release();
        let frame = frame?;

        let image = encode_jpeg(&frame, self.jpeg_quality)?;
        info!(bytes = image.encoded.len(), width = image.width, height = image.height, "foto capturada");
        Ok(image)
    }

    pub fn cancel(&mut self) {
        if let CameraState::Streaming(stream) = std::mem::replace(&mut self.state, CameraState::Idle) {
            stream.release();
            debug!("cámara liberada sin capturar");
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<CapturedImage> {
    let (width, height) = frame.dimensions();
    let mut encoded = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
        encoder
            .encode(frame.as_raw(), width, height, ColorType::Rgb8)
            .map_err(|e| AttendanceError::PhotoEncoding(e.to_string()))?;
    }
    Ok(CapturedImage {
        encoded,
        width,
        height,
    })
}

/// Camera backed by an image file that an external capture tool keeps
/// refreshed (webcam snapshot, kiosk camera dump).
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>> {
        debug!(path = %self.path.display(), ?facing, "abriendo cámara de archivo");
        let path = self.path.clone();
        let first = tokio::task::spawn_blocking(move || read_frame(&path))
            .await
            .map_err(|e| AttendanceError::CameraUnavailable(e.to_string()))??;
        Ok(Box::new(FileStream {
            path: self.path.clone(),
            last_frame: Some(first),
        }))
    }
}

struct FileStream {
    path: PathBuf,
    last_frame: Option<RgbImage>,
}

impl CameraStream for FileStream {
    fn grab_frame(&mut self) -> Result<RgbImage> {
        match read_frame(&self.path) {
            Ok(frame) => Ok(frame),
            // Snapshot being rewritten; fall back to the frame seen at open.
            Err(e) => self.last_frame.take().ok_or(e),
        }
    }

    fn release(self: Box<Self>) {
        debug!(path = %self.path.display(), "stream de archivo cerrado");
    }
}

fn read_frame(path: &Path) -> Result<RgbImage> {
    let image = image::open(path)
        .map_err(|e| AttendanceError::CameraUnavailable(format!("{}: {}", path.display(), e)))?;
    Ok(image.to_rgb8())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

#[async_trait]
impl CameraDevice for NoCamera {
    async fn open(&self, _facing: Facing) -> Result<Box<dyn CameraStream>> {
        Err(AttendanceError::CameraUnavailable("no hay cámara configurada".to_string()))
    }
}
