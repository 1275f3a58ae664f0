use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use capture::{
    CameraDevice, CameraPermissions, CaptureController, CaptureError, CaptureOutcome,
    CapturedImage, Facing, PermissionStatus,
};
use clap::{Parser, Subcommand};
use event_data::{get_event, list_events, list_events_for_user, DataSession};
use media_upload::MediaSession;
use shared::domain::{EventId, UserId};

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "eventsnap", about = "Read events and push captures to the media service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every event the data service returns.
    ListEvents,
    /// List the events a user belongs to, with attendee counts.
    MyEvents { user_id: String },
    /// Show one event with its assets.
    GetEvent { id: String },
    /// Upload an image file to the media endpoint.
    Upload { path: PathBuf },
    /// Run one capture-to-upload cycle, using a file in place of the
    /// platform camera.
    Snap {
        path: PathBuf,
        #[arg(long)]
        front: bool,
    },
}

/// Stand-in camera for the CLI: "captures" by staging a copy of an
/// existing image, so the controller can discard its temp file as usual.
struct FileCamera {
    source: PathBuf,
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn capture(&self, facing: Facing) -> Result<CapturedImage, CaptureError> {
        let staged = std::env::temp_dir().join(format!("eventsnap-capture-{}.jpg", std::process::id()));
        tokio::fs::copy(&self.source, &staged)
            .await
            .map_err(|err| CaptureError::Device(err.to_string()))?;
        Ok(CapturedImage { path: staged, facing })
    }
}

struct GrantedPermissions;

#[async_trait]
impl CameraPermissions for GrantedPermissions {
    async fn status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let settings = load_settings();
    let cli = Cli::parse();

    let data = DataSession::new(&settings.data_service_url, &settings.data_service_key);

    match cli.command {
        Command::ListEvents => {
            for event in list_events(&data).await? {
                println!("{}  {}", event.id, event.name);
            }
        }
        Command::MyEvents { user_id } => {
            for event in list_events_for_user(&data, &UserId::new(user_id)).await? {
                let attending = event
                    .attendee_count
                    .map(|count| count.to_string())
                    .unwrap_or_else(|| "?".into());
                println!("{}  {} ({attending} attending)", event.id, event.name);
            }
        }
        Command::GetEvent { id } => {
            let event = get_event(&data, &EventId::new(id)).await?;
            println!("{}  {}", event.id, event.name);
            if let Some(description) = &event.description {
                println!("  {description}");
            }
            for asset in &event.assets {
                println!("  asset {}  {}", asset.id, asset.url);
            }
        }
        Command::Upload { path } => {
            let media = MediaSession::new(&settings.media_upload_url, &settings.media_upload_preset);
            let result = media.upload(&path).await?;
            println!("uploaded {} -> {}", result.public_id, result.secure_url);
        }
        Command::Snap { path, front } => {
            let media = MediaSession::new(&settings.media_upload_url, &settings.media_upload_preset);
            let mut controller = CaptureController::new(
                Arc::new(GrantedPermissions),
                Arc::new(FileCamera { source: path }),
                Arc::new(media),
            );
            if front {
                controller.toggle_facing();
            }
            match controller.capture().await? {
                CaptureOutcome::Captured => println!("capture cycle finished, see log for the upload result"),
                CaptureOutcome::PermissionRequired => println!("camera permission not granted"),
            }
        }
    }

    Ok(())
}
