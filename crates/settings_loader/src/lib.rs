//! # Settings Loader
//!
//! Centralized configuration for the net-worth dashboard. Two sources are combined:
//!
//! - `settings.json`: non-secret settings (column names, panels, cache TTL, goal,
//!   feature flags, crypto identities). Every field is optional and falls back to
//!   [`Settings::default`].
//! - Environment (optionally seeded from a `.env` file): the sheet locator and the
//!   API credentials. The sheet locator is required, credentials are optional and
//!   their absence only disables the matching feature.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use settings_loader;
//! use std::path::PathBuf;
//!
//! settings_loader::load_dotenv();
//! let path = Some(PathBuf::from("settings.json"));
//! let settings = settings_loader::load_settings_or_default(path.as_ref())?;
//! let sheet = settings_loader::SheetLocator::from_env()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use models::{CryptoIdentity, Settings};
use thiserror::Error;

pub const SHEET_ID_VAR: &str = "SHEET_ID";
pub const SHEET_GID_VAR: &str = "SHEET_GID";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    MissingVar(String),
    #[error("setting {0} is empty")]
    EmptyVar(String),
}

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    Ok(settings)
}

/// Loads settings from `path` if given, else from `settings.json` when it exists,
/// else returns the defaults. A file that exists but does not parse is an error.
pub fn load_settings_or_default(path: Option<&PathBuf>) -> Result<Settings> {
    if let Some(settings_path) = path {
        return load_settings(settings_path);
    }
    if settings_file_exists("settings.json") {
        return load_settings("settings.json");
    }
    tracing::info!("no settings.json found, using built-in defaults");
    Ok(Settings::default())
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}

/// Seeds the process environment from `.env` when present. Existing variables win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env file: {e}"),
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Reads a variable through `lookup`, trimming stray whitespace.
pub fn optional_var<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn required_var<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Err(ConfigError::MissingVar(name.to_string())),
        Some(v) if v.trim().is_empty() => Err(ConfigError::EmptyVar(name.to_string())),
        Some(v) => Ok(v.trim().to_string()),
    }
}

/// Spreadsheet id + sheet (gid) pair identifying the ledger export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLocator {
    pub sheet_id: String,
    pub gid: String,
}

impl SheetLocator {
    /// Loads `SHEET_ID` / `SHEET_GID` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            sheet_id: required_var(lookup, SHEET_ID_VAR)?,
            gid: required_var(lookup, SHEET_GID_VAR)?,
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ExchangeCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for ExchangeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeCredentials")
            .field("access_key", &"***")
            .field("secret_key", &"***")
            .finish()
    }
}

/// `UPBIT_ACCESS_KEY_<MEMBER>` with the member upper-cased and non-alphanumerics
/// replaced by `_`.
pub fn default_key_var(prefix: &str, member: &str) -> String {
    let suffix: String = member
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}_{suffix}")
}

/// Resolves the exchange key pair for one identity. `None` when either half is
/// missing, which leaves that identity without a live balance.
pub fn exchange_credentials<F>(identity: &CryptoIdentity, lookup: &F) -> Option<ExchangeCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let access_var = identity
        .access_key_env
        .clone()
        .unwrap_or_else(|| default_key_var("UPBIT_ACCESS_KEY", &identity.member));
    let secret_var = identity
        .secret_key_env
        .clone()
        .unwrap_or_else(|| default_key_var("UPBIT_SECRET_KEY", &identity.member));

    match (optional_var(lookup, &access_var), optional_var(lookup, &secret_var)) {
        (Some(access_key), Some(secret_key)) => Some(ExchangeCredentials {
            access_key,
            secret_key,
        }),
        _ => {
            tracing::warn!(
                member = %identity.member,
                "exchange credentials {access_var}/{secret_var} not set, live balance disabled for this member"
            );
            None
        }
    }
}

/// Same as [`exchange_credentials`] against the process environment.
pub fn exchange_credentials_from_env(identity: &CryptoIdentity) -> Option<ExchangeCredentials> {
    exchange_credentials(identity, &process_env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> Box<dyn Fn(&str) -> Option<String>> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Box::new(move |name: &str| map.get(name).cloned())
    }

    fn identity(member: &str) -> CryptoIdentity {
        CryptoIdentity {
            member: member.to_string(),
            subcategory: "upbit".to_string(),
            access_key_env: None,
            secret_key_env: None,
        }
    }

    #[test]
    fn test_sheet_locator_trims_whitespace() {
        let lookup = lookup_from(&[("SHEET_ID", " abc123 \n"), ("SHEET_GID", "0 ")]);
        let locator = SheetLocator::from_lookup(&lookup).unwrap();
        assert_eq!(locator.sheet_id, "abc123");
        assert_eq!(locator.gid, "0");
    }

    #[test]
    fn test_sheet_locator_missing_gid_is_fatal() {
        let lookup = lookup_from(&[("SHEET_ID", "abc123")]);
        let err = SheetLocator::from_lookup(&lookup).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("SHEET_GID".to_string()));
    }

    #[test]
    fn test_sheet_locator_blank_value_is_rejected() {
        let lookup = lookup_from(&[("SHEET_ID", "   "), ("SHEET_GID", "0")]);
        let err = SheetLocator::from_lookup(&lookup).unwrap_err();
        assert_eq!(err, ConfigError::EmptyVar("SHEET_ID".to_string()));
    }

    #[test]
    fn test_default_key_var_sanitizes_member() {
        assert_eq!(default_key_var("UPBIT_ACCESS_KEY", "dad"), "UPBIT_ACCESS_KEY_DAD");
        assert_eq!(default_key_var("UPBIT_SECRET_KEY", "mom-2"), "UPBIT_SECRET_KEY_MOM_2");
    }

    #[test]
    fn test_exchange_credentials_resolved_from_default_vars() {
        let lookup = lookup_from(&[
            ("UPBIT_ACCESS_KEY_DAD", "ak"),
            ("UPBIT_SECRET_KEY_DAD", "sk"),
        ]);
        let creds = exchange_credentials(&identity("dad"), &lookup).unwrap();
        assert_eq!(creds.access_key, "ak");
        assert_eq!(creds.secret_key, "sk");
    }

    #[test]
    fn test_exchange_credentials_missing_half_disables_identity() {
        let lookup = lookup_from(&[("UPBIT_ACCESS_KEY_DAD", "ak")]);
        assert!(exchange_credentials(&identity("dad"), &lookup).is_none());
    }

    #[test]
    fn test_exchange_credentials_custom_var_names() {
        let mut id = identity("mom");
        id.access_key_env = Some("MY_AK".to_string());
        id.secret_key_env = Some("MY_SK".to_string());
        let lookup = lookup_from(&[("MY_AK", "a"), ("MY_SK", "s")]);
        assert!(exchange_credentials(&id, &lookup).is_some());
    }

    #[test]
    fn test_credentials_debug_hides_keys() {
        let creds = ExchangeCredentials {
            access_key: "visible?".to_string(),
            secret_key: "secret".to_string(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("\"secret\""));
        assert!(!printed.contains("visible?"));
    }

    #[test]
    fn test_load_settings_from_file() {
        let path = std::env::temp_dir().join(format!(
            "settings_loader_test_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"cache_ttl_secs": 120, "features": {"commentary": false}}"#).unwrap();

        let settings = load_settings_or_default(Some(&path)).unwrap();
        assert_eq!(settings.cache_ttl_secs, 120);
        assert!(!settings.features.commentary);
        assert!(settings.features.live_balance);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_settings_reports_invalid_json() {
        let path = std::env::temp_dir().join(format!(
            "settings_loader_bad_{}.json",
            std::process::id()
        ));
        fs::write(&path, "{not json").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("Parsing settings JSON"));
        fs::remove_file(&path).ok();
    }
}
