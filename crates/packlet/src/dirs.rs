use std::path::PathBuf;

use etcetera::{BaseStrategy, choose_base_strategy};

/// Name of the configuration file looked up in every layer
pub const CONFIG_FILE_NAME: &str = "packlet.toml";

/// Directory holding user-level packlet configuration
///
/// `$XDG_CONFIG_HOME/packlet` on Unix-likes, the roaming app data directory
/// on Windows. `None` when no home directory can be determined.
pub fn user_config_dir() -> Option<PathBuf> {
    choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("packlet"))
}

/// Path of the user-level configuration file, whether or not it exists
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
