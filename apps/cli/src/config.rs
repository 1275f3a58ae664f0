use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_service_url: String,
    pub data_service_key: String,
    pub media_upload_url: String,
    pub media_upload_preset: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_service_url: "http://127.0.0.1:54321".into(),
            data_service_key: "dev-anon-key".into(),
            media_upload_url: "http://127.0.0.1:8085/image/upload".into(),
            media_upload_preset: "unsigned-dev".into(),
        }
    }
}

/// Defaults, then `eventsnap.toml`, then environment overrides. Only the
/// service endpoints and credentials live here; everything else belongs to
/// the external services.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("eventsnap.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("data_service_url") {
                settings.data_service_url = v.clone();
            }
            if let Some(v) = file_cfg.get("data_service_key") {
                settings.data_service_key = v.clone();
            }
            if let Some(v) = file_cfg.get("media_upload_url") {
                settings.media_upload_url = v.clone();
            }
            if let Some(v) = file_cfg.get("media_upload_preset") {
                settings.media_upload_preset = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("DATA_SERVICE_URL") {
        settings.data_service_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATA_SERVICE_URL") {
        settings.data_service_url = v;
    }

    if let Ok(v) = std::env::var("DATA_SERVICE_KEY") {
        settings.data_service_key = v;
    }
    if let Ok(v) = std::env::var("APP__DATA_SERVICE_KEY") {
        settings.data_service_key = v;
    }

    if let Ok(v) = std::env::var("MEDIA_UPLOAD_URL") {
        settings.media_upload_url = v;
    }
    if let Ok(v) = std::env::var("APP__MEDIA_UPLOAD_URL") {
        settings.media_upload_url = v;
    }

    if let Ok(v) = std::env::var("MEDIA_UPLOAD_PRESET") {
        settings.media_upload_preset = v;
    }
    if let Ok(v) = std::env::var("APP__MEDIA_UPLOAD_PRESET") {
        settings.media_upload_preset = v;
    }

    settings
}
