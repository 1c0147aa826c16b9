//! Platform paths for projects and preset files.
//!
//! - **User presets**: `~/.config/reflejo/presets/` (Linux),
//!   `~/Library/Application Support/reflejo/presets/` (macOS),
//!   `%APPDATA%\reflejo\presets\` (Windows)
//! - **Projects**: `~/.config/reflejo/projects/` (and platform analogues)
//!
//! # Example
//!
//! ```rust,no_run
//! use reflejo_project::paths;
//!
//! let presets = paths::user_presets_dir();
//! for preset in reflejo_project::load_presets_from_dir(&presets) {
//!     println!("{}", preset.name);
//! }
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "reflejo";

/// Subdirectory name for preset templates.
const PRESETS_SUBDIR: &str = "presets";

/// Subdirectory name for project files.
const PROJECTS_SUBDIR: &str = "projects";

/// The user configuration directory.
///
/// Falls back to the current directory when the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// The user preset-template directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// The user projects directory.
pub fn user_projects_dir() -> PathBuf {
    user_config_dir().join(PROJECTS_SUBDIR)
}

/// Finds a preset file by name (without extension) in the user preset
/// directory.
pub fn find_preset(name: &str) -> Option<PathBuf> {
    let candidate = user_presets_dir().join(format!("{name}.toml"));
    candidate.exists().then_some(candidate)
}
