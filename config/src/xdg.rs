//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// `XDG_CONFIG_HOME` is checked explicitly so behavior is identical on every
/// platform (and overridable in tests); `dirs` provides the platform default.
fn config_path(app_name: &str) -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir);
    let path = base?.join(app_name).join("config.toml");
    path.is_file().then_some(path)
}

/// Key-value pairs from the `[env]` section. Missing file or empty section
/// yields an empty table.
pub(crate) fn load_env_table(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = config_path(app_name) else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::ConfigRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config.env)
}
