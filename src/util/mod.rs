//! Utility functions and helpers

use std::path::PathBuf;
use directories::ProjectDirs;

pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "ebay", "ebay-oauth-harness")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Masks all but the first four characters of a credential value.
pub fn mask_secret(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if visible.len() == value.len() {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
