use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use media_upload::ImageUploader;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    pub fn flipped(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Unknown,
    Denied,
    Granted,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera device failed: {0}")]
    Device(String),
    #[error("no camera device is available")]
    DeviceUnavailable,
}

/// Product of one capture. The backing file exists only for the
/// capture-to-upload cycle and is removed when the cycle ends.
#[derive(Debug)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub facing: Facing,
}

/// Platform-owned permission state, read through a capability interface.
/// The controller never stores the answer.
#[async_trait]
pub trait CameraPermissions: Send + Sync {
    async fn status(&self) -> PermissionStatus;
    async fn request(&self) -> PermissionStatus;
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn capture(&self, facing: Facing) -> Result<CapturedImage, CaptureError>;
}

pub struct MissingCameraDevice;

#[async_trait]
impl CameraDevice for MissingCameraDevice {
    async fn capture(&self, _facing: Facing) -> Result<CapturedImage, CaptureError> {
        Err(CaptureError::DeviceUnavailable)
    }
}

/// Fallback permission source for builds without a camera stack.
pub struct DeniedCameraPermissions;

#[async_trait]
impl CameraPermissions for DeniedCameraPermissions {
    async fn status(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }

    async fn request(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Permission is not granted; the screen renders the request affordance
    /// and no capture runs.
    PermissionRequired,
    /// A capture ran and its image was handed to the uploader.
    Captured,
}

pub struct CaptureController {
    facing: Facing,
    permissions: Arc<dyn CameraPermissions>,
    device: Arc<dyn CameraDevice>,
    uploader: Arc<dyn ImageUploader>,
}

impl CaptureController {
    pub fn new(
        permissions: Arc<dyn CameraPermissions>,
        device: Arc<dyn CameraDevice>,
        uploader: Arc<dyn ImageUploader>,
    ) -> Self {
        Self {
            facing: Facing::Back,
            permissions,
            device,
            uploader,
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn toggle_facing(&mut self) {
        self.facing = self.facing.flipped();
    }

    /// Permission gate, then one capture-and-upload cycle. Permission is
    /// requested at most once, only when still undetermined. The upload
    /// result never feeds back into controller state: it is logged, and the
    /// temp image is discarded whether the upload succeeded or not.
    pub async fn capture(&self) -> Result<CaptureOutcome, CaptureError> {
        let mut status = self.permissions.status().await;
        if status == PermissionStatus::Unknown {
            status = self.permissions.request().await;
        }
        if status != PermissionStatus::Granted {
            info!("capture: camera permission not granted, prompting instead");
            return Ok(CaptureOutcome::PermissionRequired);
        }

        let image = self.device.capture(self.facing).await?;
        match self.uploader.upload(&image.path).await {
            Ok(result) => info!(
                public_id = %result.public_id,
                secure_url = %result.secure_url,
                "capture: image uploaded"
            ),
            Err(err) => warn!("capture: upload failed: {err}"),
        }
        discard(image).await;
        Ok(CaptureOutcome::Captured)
    }
}

async fn discard(image: CapturedImage) {
    if let Err(err) = tokio::fs::remove_file(&image.path).await {
        warn!(
            path = %image.path.display(),
            "capture: could not remove temp image: {err}"
        );
    }
}
