// Settings store - JSON persistence of the flat settings record
//
// Storage failures never reach the rhythm logic: a broken store falls back to
// defaults and stops writing for the rest of the session.

use super::MetronomeSettings;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mymetronome";
const SETTINGS_FILE: &str = "settings.json";
pub const SETTINGS_PATH_ENV: &str = "MYMETRONOME_SETTINGS";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("No configuration directory available")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings storage disabled for this session")]
    WritesDisabled,
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    /// Set once storage is known broken, further saves are skipped
    storage_error: bool,
}

impl SettingsStore {
    /// Store backed by `$MYMETRONOME_SETTINGS` or `<config_dir>/mymetronome/settings.json`
    pub fn open_default() -> Self {
        let path = std::env::var_os(SETTINGS_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE)));

        match path {
            Some(path) => Self::with_path(path),
            None => {
                warn!("{}, settings will not be persisted", SettingsError::NoConfigDir);
                Self {
                    path: None,
                    storage_error: true,
                }
            }
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            storage_error: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True once a read or write failed during this session
    pub fn is_disabled(&self) -> bool {
        self.storage_error
    }

    /// Load stored settings, falling back to defaults
    ///
    /// A missing file is not an error: the defaults are written back so the
    /// next launch finds them. Numbers outside their bounds are rounded and
    /// clamped, an unknown note value reads as quarters. Only unreadable files
    /// or content that is not a settings record return the defaults and
    /// disable writes.
    pub fn load(&mut self) -> MetronomeSettings {
        let Some(path) = self.path.clone() else {
            return MetronomeSettings::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<MetronomeSettings>(&contents) {
                Ok(settings) => {
                    debug!("Settings loaded from {}", path.display());
                    settings
                }
                Err(e) => {
                    self.disable(&SettingsError::Json(e));
                    MetronomeSettings::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let defaults = MetronomeSettings::default();
                info!("No stored settings, writing defaults to {}", path.display());
                let _ = self.save(&defaults);
                defaults
            }
            Err(e) => {
                self.disable(&SettingsError::Io(e));
                MetronomeSettings::default()
            }
        }
    }

    /// Persist settings; failure is reported once and disables later writes
    pub fn save(&mut self, settings: &MetronomeSettings) -> Result<(), SettingsError> {
        if self.storage_error {
            return Err(SettingsError::WritesDisabled);
        }
        let Some(path) = self.path.as_deref() else {
            return Err(SettingsError::WritesDisabled);
        };

        match write_settings(path, settings) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.disable(&e);
                Err(e)
            }
        }
    }

    fn disable(&mut self, reason: &SettingsError) {
        warn!("Settings storage unavailable ({}), using in-memory settings", reason);
        self.storage_error = true;
    }
}

fn write_settings(path: &Path, settings: &MetronomeSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(settings)?;
    fs::write(path, json)?;
    Ok(())
}
