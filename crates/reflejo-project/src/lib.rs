//! Project persistence for the reflejo engine.
//!
//! The project file is the JSON snapshot the editor saves and reopens:
//! ordered layers with their settings and static values, every network
//! keyed by parameter id, and editor preferences. Node scratch and live
//! values are never persisted. Loading is lenient where user data is at
//! stake: unknown component kinds become broken placeholder layers,
//! networks referencing unknown node kinds come back disabled, malformed
//! edges drop with a warning, and only a version problem aborts the load.
//!
//! Graph preset templates travel separately as TOML files in the user
//! preset directory (see [`paths`]).

pub mod error;
pub mod format;
pub mod paths;
pub mod preset_file;
pub mod project;

pub use error::ProjectError;
pub use format::{
    EdgeRecord, LayerRecord, NetworkRecord, NodeRecord, PreferencesRecord, ProjectFile,
    SettingsRecord, StoredTree, StoredValue, FORMAT_VERSION,
};
pub use preset_file::{load_preset_file, load_presets_from_dir, save_preset_file};
pub use project::{
    load_project, load_project_from_file, load_project_from_str, save_project,
    save_project_to_file, save_project_to_string,
};
