//! Server configuration loaded from `GANGWAY_*` environment variables via
//! `envy`, plus Proxmox API-user normalization.
//!
//! The environment is read exactly once, here; everything downstream
//! receives explicit structs ([`gangway_common::ConnectionDefaults`], the
//! allow-list) so the core stays testable without process-wide env
//! mutation.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use gangway_common::{AllowList, ConnectionDefaults};

/// Full server configuration. Each field maps to `GANGWAY_<FIELD>`:
///
/// - `GANGWAY_LISTEN_ADDR`              (default `0.0.0.0:8000`)
/// - `GANGWAY_PROXMOX_HOST`             (Proxmox API disabled when unset)
/// - `GANGWAY_PROXMOX_PORT`             (default `8006`)
/// - `GANGWAY_PROXMOX_USER`             (default `root@<realm>`; supports `user@realm!token`)
/// - `GANGWAY_PROXMOX_REALM`            (default `pam`)
/// - `GANGWAY_PROXMOX_TOKEN_NAME` / `GANGWAY_PROXMOX_TOKEN_VALUE`
/// - `GANGWAY_PROXMOX_PASSWORD`         (ticket auth; token auth preferred)
/// - `GANGWAY_PROXMOX_VERIFY_SSL`       (default `false`)
/// - `GANGWAY_SSH_HOST` / `_USER` / `_PORT` / `_KEY_PATH` / `_KEY_B64` / `_PASSWORD`
/// - `GANGWAY_SSH_STRICT_HOST_KEY`      (default `false`)
/// - `GANGWAY_SSH_FALLBACK_KEY_PATH`    (default `/keys/pve_id_rsa`)
/// - `GANGWAY_ALLOWED_EXECUTABLES`      (comma-separated override)
/// - `GANGWAY_LXC_PASSWORD_MIN_LENGTH`  (default `5`)
/// - `GANGWAY_OPS_LOG_CAPACITY`         (default `256`)
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    // Proxmox VE API
    pub proxmox_host: Option<String>,
    #[serde(default = "default_proxmox_port")]
    pub proxmox_port: u16,
    pub proxmox_user: Option<String>,
    #[serde(default = "default_proxmox_realm")]
    pub proxmox_realm: String,
    pub proxmox_token_name: Option<String>,
    pub proxmox_token_value: Option<String>,
    pub proxmox_password: Option<String>,
    #[serde(default)]
    pub proxmox_verify_ssl: bool,

    // SSH defaults (used by /ssh/run fallbacks and as the PVE host
    // connection for /lxc/exec and /deploy)
    pub ssh_host: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_port: Option<u16>,
    pub ssh_key_path: Option<String>,
    pub ssh_key_b64: Option<String>,
    pub ssh_password: Option<String>,
    #[serde(default)]
    pub ssh_strict_host_key: bool,
    #[serde(default = "default_fallback_key_path")]
    pub ssh_fallback_key_path: PathBuf,

    // Command policy and bookkeeping
    pub allowed_executables: Option<String>,
    #[serde(default = "default_lxc_password_min_length")]
    pub lxc_password_min_length: usize,
    #[serde(default = "default_ops_log_capacity")]
    pub ops_log_capacity: usize,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_proxmox_port() -> u16 {
    8006
}

fn default_proxmox_realm() -> String {
    "pam".to_string()
}

fn default_fallback_key_path() -> PathBuf {
    PathBuf::from("/keys/pve_id_rsa")
}

fn default_lxc_password_min_length() -> usize {
    gangway_common::lxc::DEFAULT_PASSWORD_MIN_LEN
}

fn default_ops_log_capacity() -> usize {
    256
}

impl Config {
    /// Load from `GANGWAY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but malformed.
    pub fn from_env() -> Result<Self> {
        envy::prefixed("GANGWAY_")
            .from_env()
            .context("failed to load config from GANGWAY_* env vars")
    }

    /// The command allow-list: explicit override or the built-in default.
    #[must_use]
    pub fn allow_list(&self) -> AllowList {
        match &self.allowed_executables {
            Some(names) => AllowList::new(
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            ),
            None => AllowList::default(),
        }
    }

    /// SSH fallbacks handed to the connection-spec resolver.
    #[must_use]
    pub fn connection_defaults(&self) -> ConnectionDefaults {
        ConnectionDefaults {
            host: self.ssh_host.clone(),
            user: self.ssh_user.clone(),
            port: self.ssh_port,
            key_path: self.ssh_key_path.clone(),
            key_material: self.ssh_key_b64.clone(),
            password: self.ssh_password.clone(),
            strict_host_key: self.ssh_strict_host_key,
            fallback_key_path: Some(self.ssh_fallback_key_path.clone()),
        }
    }
}

/// Normalize the Proxmox API user and token name.
///
/// Supports the `user@realm!token` syntax Proxmox uses for API tokens: a
/// token name embedded after `!` is derived automatically unless an
/// explicit token name is configured. An empty user defaults to
/// `root@<realm>`.
///
/// # Errors
///
/// Returns an error when the user part before `!` is empty.
pub fn resolve_api_user(
    raw_user: Option<&str>,
    realm: &str,
    explicit_token_name: Option<&str>,
) -> Result<(String, Option<String>)> {
    let mut user = raw_user.unwrap_or_default().trim().to_string();
    if user.is_empty() {
        user = format!("root@{realm}");
    }

    let explicit = explicit_token_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let mut embedded = None;
    if let Some((user_part, token_part)) = user.split_once('!') {
        if user_part.trim().is_empty() {
            bail!("invalid GANGWAY_PROXMOX_USER: user part before '!' is empty");
        }
        embedded = Some(token_part.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        user = user_part.trim().to_string();
    }

    let token_name = explicit.or(embedded);
    Ok((user, token_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_user_defaults_to_root_at_realm() {
        let (user, token) = resolve_api_user(None, "pam", None).expect("resolve");
        assert_eq!(user, "root@pam");
        assert_eq!(token, None);
    }

    #[test]
    fn test_resolve_api_user_derives_token_from_bang_suffix() {
        let (user, token) = resolve_api_user(Some("root@pam!WebUI"), "pam", None).expect("resolve");
        assert_eq!(user, "root@pam");
        assert_eq!(token.as_deref(), Some("WebUI"));
    }

    #[test]
    fn test_resolve_api_user_explicit_token_name_wins() {
        let (user, token) =
            resolve_api_user(Some("root@pam!embedded"), "pam", Some("explicit")).expect("resolve");
        assert_eq!(user, "root@pam");
        assert_eq!(token.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_resolve_api_user_rejects_empty_user_before_bang() {
        assert!(resolve_api_user(Some("!token"), "pam", None).is_err());
    }

    #[test]
    fn test_resolve_api_user_blank_embedded_token_is_none() {
        let (user, token) = resolve_api_user(Some("ops@pve!  "), "pve", None).expect("resolve");
        assert_eq!(user, "ops@pve");
        assert_eq!(token, None);
    }

    #[test]
    fn test_allow_list_override_splits_and_trims() {
        let config = config_with(|c| {
            c.allowed_executables = Some(" ls , echo ,, uptime ".to_string());
        });
        let allow = config.allow_list();
        assert!(allow.contains("ls"));
        assert!(allow.contains("echo"));
        assert!(allow.contains("uptime"));
        assert!(!allow.contains("cat"));
    }

    #[test]
    fn test_allow_list_default_carries_builtin_set() {
        let allow = config_with(|_| {}).allow_list();
        assert!(allow.contains("systemctl"));
        assert!(allow.contains("apt-get"));
        assert!(!allow.contains("rm"));
    }

    #[test]
    fn test_connection_defaults_mapping() {
        let config = config_with(|c| {
            c.ssh_host = Some("pve.internal".to_string());
            c.ssh_port = Some(2222);
            c.ssh_strict_host_key = true;
        });
        let defaults = config.connection_defaults();
        assert_eq!(defaults.host.as_deref(), Some("pve.internal"));
        assert_eq!(defaults.port, Some(2222));
        assert!(defaults.strict_host_key);
        assert_eq!(
            defaults.fallback_key_path.as_deref(),
            Some(std::path::Path::new("/keys/pve_id_rsa"))
        );
    }

    fn config_with(mutate: impl FnOnce(&mut Config)) -> Config {
        let mut config = Config {
            listen_addr: default_listen_addr(),
            proxmox_host: None,
            proxmox_port: default_proxmox_port(),
            proxmox_user: None,
            proxmox_realm: default_proxmox_realm(),
            proxmox_token_name: None,
            proxmox_token_value: None,
            proxmox_password: None,
            proxmox_verify_ssl: false,
            ssh_host: None,
            ssh_user: None,
            ssh_port: None,
            ssh_key_path: None,
            ssh_key_b64: None,
            ssh_password: None,
            ssh_strict_host_key: false,
            ssh_fallback_key_path: default_fallback_key_path(),
            allowed_executables: None,
            lxc_password_min_length: default_lxc_password_min_length(),
            ops_log_capacity: default_ops_log_capacity(),
        };
        mutate(&mut config);
        config
    }
}
