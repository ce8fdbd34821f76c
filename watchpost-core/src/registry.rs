//! Static host and check registry
//!
//! The registry is a TOML file with a `[servers.<key>]` table per target
//! host and a `[[checks]]` array of tables. Checks run in the order they
//! are declared. This module only loads and resolves configuration; it
//! never touches the network.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{RegistryError, RegistryResult};
use crate::ssh::AuthCredential;

const fn default_port() -> u16 {
    22
}

fn default_jump_target() -> String {
    "ciap01".into()
}

fn default_query_sql() -> String {
    "SELECT jobid, maxvalue, region_id FROM boundary \
     WHERE jobid LIKE '%Usage%' AND maxvalue IS NOT NULL \
     AND region_id <> 'Unknown' ORDER BY maxvalue;"
        .into()
}

fn default_database() -> String {
    "sai".into()
}

fn default_db_user() -> String {
    "sairepo".into()
}

fn default_columns() -> [String; 3] {
    ["jobid".into(), "maxvalue".into(), "region_id".into()]
}

fn default_mount() -> String {
    "/boot".into()
}

/// Connection profile for one target server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerProfile {
    /// Human-readable label for logs and summaries
    #[serde(default)]
    pub label: String,
    /// Hostname or IP address
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user
    pub user: String,
    /// Path to a private key file (tilde-expanded)
    #[serde(default)]
    pub key_path: Option<String>,
    /// Plaintext password (prefer `password_env`)
    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,
}

impl ServerProfile {
    /// Resolves the credential for this server
    ///
    /// Key-based auth wins when both a key and a password are configured.
    /// `password_env` is consulted before the inline `password`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyPasswordEnv`] when the configured
    /// variable is unset or empty, or [`RegistryError::MissingCredential`]
    /// when no credential source is configured at all.
    pub fn credential(&self, server_key: &str) -> RegistryResult<AuthCredential> {
        if let Some(key_path) = &self.key_path {
            let expanded = shellexpand::tilde(key_path);
            return Ok(AuthCredential::Key {
                path: PathBuf::from(expanded.as_ref()),
            });
        }
        if let Some(var) = &self.password_env {
            let value = std::env::var(var).unwrap_or_default();
            if value.is_empty() {
                return Err(RegistryError::EmptyPasswordEnv {
                    var: var.clone(),
                    server: server_key.to_string(),
                });
            }
            return Ok(AuthCredential::Password {
                password: SecretString::from(value),
            });
        }
        if let Some(password) = &self.password {
            if !password.is_empty() {
                return Ok(AuthCredential::Password {
                    password: SecretString::from(password.clone()),
                });
            }
        }
        Err(RegistryError::MissingCredential {
            server: server_key.to_string(),
        })
    }
}

/// Parameters for the tabular-query check
#[derive(Debug, Clone, Deserialize)]
pub struct QueryParams {
    /// Inner host reached through the entry host (nested SSH hop)
    #[serde(default = "default_jump_target")]
    pub jump_target: String,
    /// SQL statement executed on the jump host
    #[serde(default = "default_query_sql")]
    pub sql: String,
    /// Database name passed to psql
    #[serde(default = "default_database")]
    pub database: String,
    /// Database user passed to psql
    #[serde(default = "default_db_user")]
    pub db_user: String,
    /// Expected table header column names, in order
    #[serde(default = "default_columns")]
    pub columns: [String; 3],
    /// Extra banner patterns stripped from output, in addition to the
    /// built-in set
    #[serde(default)]
    pub extra_banner_patterns: Vec<String>,
}

/// Parameters for the pod-list check
#[derive(Debug, Clone, Deserialize)]
pub struct PodsParams {
    /// Kubernetes namespace to list
    pub namespace: String,
    /// Case-insensitive grep patterns selecting the pods of interest
    pub grep_patterns: Vec<String>,
}

/// Parameters for the disk-usage check
#[derive(Debug, Clone, Deserialize)]
pub struct DiskParams {
    /// Mount point whose usage is inspected
    #[serde(default = "default_mount")]
    pub mount: String,
}

/// Check-type-specific parameters, tagged by `type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckKind {
    /// Tabular SQL query freshness check (via jump host)
    Query(QueryParams),
    /// Kubernetes pod health check
    Pods(PodsParams),
    /// Disk usage check for a single mount point
    Disk(DiskParams),
}

impl CheckKind {
    /// The `type` tag as serialized in the snapshot
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::Pods(_) => "pods",
            Self::Disk(_) => "disk",
        }
    }
}

/// One configured diagnostic unit
#[derive(Debug, Clone, Deserialize)]
pub struct CheckSpec {
    /// Check identifier, also used for the raw artifact name
    pub name: String,
    /// Registry key of the target server
    pub server: String,
    /// Type and parameters
    #[serde(flatten)]
    pub kind: CheckKind,
}

/// The full registry: servers plus ordered checks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registry {
    /// Connection profiles keyed by server name
    #[serde(default)]
    pub servers: BTreeMap<String, ServerProfile>,
    /// Checks in declaration order
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

impl Registry {
    /// Loads and parses a registry TOML file
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the file cannot be read and
    /// [`RegistryError::Parse`] when it is not valid TOML.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a registry from TOML text
    ///
    /// # Errors
    ///
    /// Returns the underlying TOML error on malformed input.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Looks up a server profile by registry key
    #[must_use]
    pub fn server(&self, key: &str) -> Option<&ServerProfile> {
        self.servers.get(key)
    }
}
