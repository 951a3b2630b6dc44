use crate::direction::{ProgressBarPosition, ReadingDirection};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use once_cell::sync::Lazy;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = ".manga_pager_settings.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Pages kept loaded on each side of the current one.
    #[serde(default = "default_image_preload_amount")]
    pub image_preload_amount: usize,

    #[serde(default)]
    pub progress_bar_position: ProgressBarPosition,

    #[serde(default)]
    pub reading_direction: ReadingDirection,

    #[serde(default)]
    pub double_page: bool,

    #[serde(default = "default_cover_alone")]
    pub cover_alone: bool,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_image_preload_amount() -> usize {
    5
}

fn default_cover_alone() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            image_preload_amount: default_image_preload_amount(),
            progress_bar_position: ProgressBarPosition::default(),
            reading_direction: ReadingDirection::default(),
            double_page: false,
            cover_alone: default_cover_alone(),
        }
    }
}

static SETTINGS: Lazy<RwLock<Settings>> = Lazy::new(|| RwLock::new(Settings::default()));

fn settings_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = settings_path() else {
        warn!("Could not determine home directory, using default settings");
        return;
    };

    if let Some(settings) = load_settings_from(&path) {
        if let Ok(mut global) = SETTINGS.write() {
            *global = settings;
        }
    }
}

/// Reads settings from `path`, creating the file with defaults when it does
/// not exist. Returns `None` when the file exists but cannot be used.
pub fn load_settings_from(path: &Path) -> Option<Settings> {
    if !path.exists() {
        info!(
            "Settings file not found at {:?}, creating with defaults",
            path
        );
        let settings = Settings::default();
        save_settings_to(&settings, path);
        return Some(settings);
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {:?}", path);

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to(&settings, path);
                }

                Some(settings)
            }
            Err(e) => {
                error!("Failed to parse settings file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            error!("Failed to read settings file {:?}: {}", path, e);
            None
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

pub fn save_settings() {
    let Some(path) = settings_path() else {
        warn!("Could not determine home directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to(&settings, &path);
    }
}

pub fn save_settings_to(settings: &Settings, path: &Path) {
    let content = match serde_yaml::to_string(settings) {
        Ok(yaml) => format!("{SETTINGS_HEADER}{yaml}"),
        Err(e) => {
            error!("Failed to serialize settings: {}", e);
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {:?}", path),
        Err(e) => error!("Failed to save settings to {:?}: {}", path, e),
    }
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# manga-pager settings
# ============================================================================
# image_preload_amount:  pages kept loaded before and after the current one
# progress_bar_position: bottom | left | right
# reading_direction:     left_to_right | right_to_left
# double_page:           show two pages side by side
# cover_alone:           in double page mode, keep the first page on its own

"#;

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}

pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
    save_settings();
}
