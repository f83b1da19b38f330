use crate::permissions::Permission;
use crate::platform::{LensFacing, Quality};
use chrono::format::{Item, StrftimeItems};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Upper bound for the simulated backend frame rate
pub const MAX_FRAME_RATE: u32 = 240;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub platform: PlatformConfig,
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlatformConfig {
    /// Platform API level; 28 and below require the legacy storage permission
    #[serde(default = "default_api_level")]
    pub api_level: u32,

    /// Permissions already granted when the session starts
    #[serde(default)]
    pub granted: Vec<Permission>,

    /// Permissions the user approves when prompted
    #[serde(default = "default_grant_on_request")]
    pub grant_on_request: Vec<Permission>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Lens directions present on the device
    #[serde(default = "default_lenses")]
    pub lenses: Vec<LensFacing>,

    /// Video qualities the device can record
    #[serde(default = "default_supported_qualities")]
    pub supported_qualities: Vec<Quality>,

    /// Preview/recording frame rate of the simulated backend
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Photo resolution (width, height)
    #[serde(default = "default_photo_resolution")]
    pub photo_resolution: (u32, u32),

    /// Make every bind attempt fail (resource contention)
    #[serde(default)]
    pub fail_binding: bool,

    /// Make every photo capture fail
    #[serde(default)]
    pub fail_photo: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Root directory standing in for shared device storage
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Relative path for photos on non-legacy platforms
    #[serde(default = "default_picture_path")]
    pub picture_path: String,

    /// Relative path for videos on non-legacy platforms
    #[serde(default = "default_movie_path")]
    pub movie_path: String,

    /// chrono format used for display names
    #[serde(default = "default_filename_format")]
    pub filename_format: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl AppConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("camapp.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("platform.api_level", default_api_level())?
            .set_default("platform.granted", Vec::<String>::new())?
            .set_default(
                "platform.grant_on_request",
                permission_names(&default_grant_on_request()),
            )?
            .set_default(
                "camera.lenses",
                default_lenses()
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>(),
            )?
            .set_default(
                "camera.supported_qualities",
                default_supported_qualities()
                    .iter()
                    .map(|q| q.to_string())
                    .collect::<Vec<_>>(),
            )?
            .set_default("camera.frame_rate", default_frame_rate())?
            .set_default(
                "camera.photo_resolution",
                vec![default_photo_resolution().0, default_photo_resolution().1],
            )?
            .set_default("camera.fail_binding", false)?
            .set_default("camera.fail_photo", false)?
            .set_default("storage.root", default_storage_root())?
            .set_default("storage.picture_path", default_picture_path())?
            .set_default("storage.movie_path", default_movie_path())?
            .set_default("storage.filename_format", default_filename_format())?
            .set_default(
                "session.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with CAMAPP_ prefix
            .add_source(
                Environment::with_prefix("CAMAPP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("platform.granted")
                    .with_list_parse_key("platform.grant_on_request")
                    .with_list_parse_key("camera.lenses")
                    .with_list_parse_key("camera.supported_qualities")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage root must not be empty".to_string(),
            ));
        }

        if self.storage.filename_format.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage filename_format must not be empty".to_string(),
            ));
        }

        if self.storage.filename_format.contains('/') {
            return Err(ConfigError::Message(
                "Storage filename_format must not contain '/'".to_string(),
            ));
        }

        if StrftimeItems::new(&self.storage.filename_format)
            .any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::Message(format!(
                "Storage filename_format '{}' is not a valid chrono format",
                self.storage.filename_format
            )));
        }

        if self.camera.supported_qualities.is_empty() {
            return Err(ConfigError::Message(
                "Camera must support at least one video quality".to_string(),
            ));
        }

        if self.camera.frame_rate == 0 || self.camera.frame_rate > MAX_FRAME_RATE {
            return Err(ConfigError::Message(format!(
                "Camera frame_rate must be between 1 and {}",
                MAX_FRAME_RATE
            )));
        }

        if self.camera.photo_resolution.0 == 0 || self.camera.photo_resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera photo_resolution must be greater than 0".to_string(),
            ));
        }

        if self.session.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Default configuration rendered as TOML
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            platform: PlatformConfig {
                api_level: default_api_level(),
                granted: Vec::new(),
                grant_on_request: default_grant_on_request(),
            },
            camera: CameraConfig {
                lenses: default_lenses(),
                supported_qualities: default_supported_qualities(),
                frame_rate: default_frame_rate(),
                photo_resolution: default_photo_resolution(),
                fail_binding: false,
                fail_photo: false,
            },
            storage: StorageConfig {
                root: default_storage_root(),
                picture_path: default_picture_path(),
                movie_path: default_movie_path(),
                filename_format: default_filename_format(),
            },
            session: SessionConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

fn permission_names(permissions: &[Permission]) -> Vec<String> {
    permissions.iter().map(|p| p.to_string()).collect()
}

// Default value functions
fn default_api_level() -> u32 {
    34
}
fn default_grant_on_request() -> Vec<Permission> {
    vec![
        Permission::Camera,
        Permission::RecordAudio,
        Permission::WriteExternalStorage,
    ]
}

fn default_lenses() -> Vec<LensFacing> {
    vec![LensFacing::Back, LensFacing::Front]
}
fn default_supported_qualities() -> Vec<Quality> {
    vec![Quality::Sd, Quality::Hd, Quality::Fhd]
}
fn default_frame_rate() -> u32 {
    30
}
fn default_photo_resolution() -> (u32, u32) {
    (1280, 720)
}

fn default_storage_root() -> String {
    "./media".to_string()
}
fn default_picture_path() -> String {
    "Pictures/CameraX-Image".to_string()
}
fn default_movie_path() -> String {
    "Movies/CameraX-Video".to_string()
}
fn default_filename_format() -> String {
    "%Y-%m-%d-%H-%M-%S-%3f".to_string()
}

fn default_event_bus_capacity() -> usize {
    100
}
