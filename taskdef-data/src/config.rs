use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::identity::UnauthenticatedAccess;
use crate::query::{Dialect, IdentifierPolicy, QueryBuilder};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading config.
    Load(String),
    /// A value was present but could not be interpreted.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Environment variable prefix for overrides (`TASKDEF_TABLE_PREFIX`, ...).
pub const ENV_PREFIX: &str = "TASKDEF_";

/// Repository settings.
///
/// Resolution order (lowest to highest priority):
/// 1. Built-in defaults
/// 2. YAML document ([`from_yaml_str`](Self::from_yaml_str) / [`load`](Self::load))
/// 3. `TASKDEF_*` environment variables ([`with_env_overrides`](Self::with_env_overrides))
///
/// ```yaml
/// table_prefix: "TASK_"
/// table_suffix: ""
/// dialect: postgres
/// identifier_policy: validate
/// unauthenticated: deny
/// anonymous_owner: anonymousUser
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub table_prefix: String,
    pub table_suffix: String,
    pub dialect: Dialect,
    pub identifier_policy: IdentifierPolicy,
    pub unauthenticated: UnauthenticatedAccess,
    /// Owner stamped on saves by unauthenticated callers under [`UnauthenticatedAccess::Unscoped`].
    pub anonymous_owner: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            table_prefix: "TASK_".into(),
            table_suffix: String::new(),
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Validate,
            unauthenticated: UnauthenticatedAccess::Unscoped,
            anonymous_owner: "anonymousUser".into(),
        }
    }
}

impl RepositoryConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "repository config not found, using defaults");
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading repository config");
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::from_yaml_str(&content)
    }

    /// Overlay the process environment.
    pub fn from_env(self) -> Result<Self, ConfigError> {
        self.with_env_overrides(std::env::vars())
    }

    /// Overlay `TASKDEF_*` variables from `vars`; unrelated variables are ignored.
    pub fn with_env_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            match field {
                "TABLE_PREFIX" => self.table_prefix = value,
                "TABLE_SUFFIX" => self.table_suffix = value,
                "ANONYMOUS_OWNER" => self.anonymous_owner = value,
                "DIALECT" => self.dialect = parse_env(key.as_ref(), &value)?,
                "UNAUTHENTICATED" => self.unauthenticated = parse_env(key.as_ref(), &value)?,
                _ => {}
            }
        }
        Ok(self)
    }

    /// Full table name for `E`: prefix + base name + suffix.
    pub fn table_name<E: Entity>(&self) -> String {
        format!("{}{}{}", self.table_prefix, E::table_name(), self.table_suffix)
    }

    /// A builder over `E`'s table using the configured dialect and identifier policy.
    pub fn query<E: Entity>(&self) -> QueryBuilder {
        QueryBuilder::new_with_dialect(&self.table_name::<E>(), self.dialect)
            .identifier_policy(self.identifier_policy)
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(|message| ConfigError::Invalid {
        key: key.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TaskDefinition;
    use std::io::Write;

    #[test]
    fn defaults_match_the_task_table() {
        let config = RepositoryConfig::default();
        assert_eq!(config.table_name::<TaskDefinition>(), "TASK_DEFINITIONS");
        assert_eq!(config.unauthenticated, UnauthenticatedAccess::Unscoped);
        assert_eq!(config.anonymous_owner, "anonymousUser");
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let yaml = r#"
table_prefix: "APP_"
table_suffix: "_V2"
dialect: postgres
unauthenticated: deny
"#;
        let config = RepositoryConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.table_name::<TaskDefinition>(), "APP_DEFINITIONS_V2");
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.unauthenticated, UnauthenticatedAccess::Deny);
        assert_eq!(config.identifier_policy, IdentifierPolicy::Validate);
    }

    #[test]
    fn malformed_yaml_is_a_load_error() {
        let err = RepositoryConfig::from_yaml_str("dialect: [oops").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        let err = RepositoryConfig::from_yaml_str("dialect: oracle").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn env_overrides_win() {
        let config = RepositoryConfig::default()
            .with_env_overrides([
                ("TASKDEF_TABLE_PREFIX", "T_"),
                ("TASKDEF_DIALECT", "sqlite"),
                ("TASKDEF_UNAUTHENTICATED", "deny"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.table_prefix, "T_");
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert_eq!(config.unauthenticated, UnauthenticatedAccess::Deny);
    }

    #[test]
    fn invalid_env_value_names_the_variable() {
        let err = RepositoryConfig::default()
            .with_env_overrides([("TASKDEF_DIALECT", "oracle")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "TASKDEF_DIALECT"));
    }

    #[test]
    fn load_reads_file_and_tolerates_missing_one() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "anonymous_owner: nobody").unwrap();
        let config = RepositoryConfig::load(file.path()).unwrap();
        assert_eq!(config.anonymous_owner, "nobody");

        let missing = RepositoryConfig::load("/nonexistent/taskdef.yaml").unwrap();
        assert_eq!(missing, RepositoryConfig::default());
    }

    #[test]
    fn query_uses_configured_dialect() {
        let config = RepositoryConfig {
            dialect: Dialect::Postgres,
            ..RepositoryConfig::default()
        };
        let (sql, _) = config
            .query::<TaskDefinition>()
            .where_eq("CREATOR", "alice")
            .build_count()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM TASK_DEFINITIONS WHERE CREATOR = $1");
    }
}
