//! CLI configuration.
//!
//! Settings come from a TOML file, then environment variables override
//! individual values.
//!
//! # Example
//!
//! ```toml
//! [api]
//! base_url = "https://farm.example.com"
//! token = "9f2c..."
//!
//! [session]
//! user_id = "4"
//! username = "asha"
//! role = "admin"
//! ```

use std::path::Path;

use dairyops_controller::{CurrentUser, SessionContext};
use dairyops_core::Role;
use dairyops_storage::BearerToken;
use serde::Deserialize;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "dairyops.toml";
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub(crate) const ENV_API_URL: &str = "DAIRYOPS_API_URL";
pub(crate) const ENV_TOKEN: &str = "DAIRYOPS_TOKEN";
pub(crate) const ENV_ROLE: &str = "DAIRYOPS_ROLE";

// ── File format ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub session: SessionSection,
}

/// `[api]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiSection {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// `[session]` section: who the token belongs to.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SessionSection {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
}

// ── Resolved settings ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub base_url: String,
    pub session: SessionContext,
}

/// Read and parse a config TOML file from `path`.
pub(crate) fn read_config(path: &Path) -> Result<ConfigFile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

/// Load settings from `explicit` (which must exist) or from
/// `./dairyops.toml` when present, then apply environment overrides.
pub(crate) fn load_settings(explicit: Option<&Path>) -> Result<Settings, String> {
    let file = match explicit {
        Some(path) => read_config(path)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                read_config(default)?
            } else {
                ConfigFile::default()
            }
        }
    };
    resolve(file, |key| std::env::var(key).ok())
}

/// Merge a parsed file with overrides looked up through `env`.
pub(crate) fn resolve(
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, String> {
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let base_url = non_empty(ENV_API_URL)
        .or(file.api.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let token = non_empty(ENV_TOKEN).or(file.api.token).map(BearerToken::new);
    let role = match non_empty(ENV_ROLE) {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| format!("invalid {}: {}", ENV_ROLE, e))?,
        None => file.session.role.unwrap_or_default(),
    };

    let user = CurrentUser {
        id: file.session.user_id.unwrap_or_default(),
        username: file.session.username.unwrap_or_default(),
        role,
    };
    Ok(Settings {
        base_url,
        session: SessionContext::new(user, token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn file_values_are_used() {
        let file: ConfigFile = toml::from_str(
            r#"
            [api]
            base_url = "https://farm.example.com"
            token = "abc"

            [session]
            user_id = "4"
            username = "asha"
            role = "admin"
            "#,
        )
        .unwrap();
        let settings = resolve(file, env(&[])).unwrap();
        assert_eq!(settings.base_url, "https://farm.example.com");
        assert_eq!(settings.session.credential().unwrap().expose(), "abc");
        assert_eq!(settings.session.role(), Role::Admin);
        assert_eq!(settings.session.user().id, "4");
    }

    #[test]
    fn environment_overrides_file() {
        let file: ConfigFile = toml::from_str("[api]\ntoken = \"from-file\"\n").unwrap();
        let settings = resolve(
            file,
            env(&[
                (ENV_TOKEN, "from-env"),
                (ENV_API_URL, "http://10.0.0.2:8000"),
                (ENV_ROLE, "admin"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.session.credential().unwrap().expose(), "from-env");
        assert_eq!(settings.base_url, "http://10.0.0.2:8000");
        assert_eq!(settings.session.role(), Role::Admin);
    }

    #[test]
    fn empty_config_has_no_credential() {
        let settings = resolve(ConfigFile::default(), env(&[])).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert!(settings.session.credential().is_err());
        assert_eq!(settings.session.role(), Role::Supervisor);
    }

    #[test]
    fn bad_role_is_reported() {
        let err = resolve(ConfigFile::default(), env(&[(ENV_ROLE, "owner")])).unwrap_err();
        assert!(err.contains(ENV_ROLE));
    }
}
