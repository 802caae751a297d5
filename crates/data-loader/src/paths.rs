//! Locations of the artifact files.

use std::path::{Path, PathBuf};

pub const DEFAULT_INTERACTIONS_FILE: &str = "UI_csr.json";
pub const DEFAULT_USER_MAPPINGS_FILE: &str = "user_mappings.json";
pub const DEFAULT_ITEM_MAPPINGS_FILE: &str = "item_mappings.json";
pub const DEFAULT_MODEL_FILE: &str = "als_model.json";

/// Full paths of the four artifacts the recommender reads at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub interactions: PathBuf,
    pub user_mappings: PathBuf,
    pub item_mappings: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Default file names resolved against `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            interactions: dir.join(DEFAULT_INTERACTIONS_FILE),
            user_mappings: dir.join(DEFAULT_USER_MAPPINGS_FILE),
            item_mappings: dir.join(DEFAULT_ITEM_MAPPINGS_FILE),
            model: dir.join(DEFAULT_MODEL_FILE),
        }
    }
}

impl Default for ArtifactPaths {
    /// Default file names in the current working directory
    fn default() -> Self {
        Self::in_dir(".")
    }
}
