//! Path utilities: expand ~ in configured paths.

use std::path::PathBuf;

/// `~` and `~/...` resolve against the home directory; anything else is
/// taken as is.
pub fn expand_tilde(path: &str) -> PathBuf {
    let path = path.trim();

    if let Some(home) = dirs::home_dir() {
        if path == "~" {
            return home;
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return home.join(rest);
        }
    }

    PathBuf::from(path)
}
