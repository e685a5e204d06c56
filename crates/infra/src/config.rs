//! Engine configuration loading and representation.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use millops_auth::RolePolicy;
use millops_inventory::{StepClassifier, StepVocabulary};

pub const ENV_INVENTORY_ROLES: &str = "MILLOPS_INVENTORY_ROLES";
pub const ENV_STEP_VOCABULARY: &str = "MILLOPS_STEP_VOCABULARY";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is set but empty")]
    Empty { var: &'static str },

    #[error("failed to read step vocabulary from {path}: {source}")]
    VocabularyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed step vocabulary in {path}: {source}")]
    VocabularyFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Roles granted `inventory.adjust`.
    pub inventory_roles: Vec<String>,
    pub vocabulary: StepVocabulary,
    pub database_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inventory_roles: vec!["WAREHOUSE".to_string(), "SELLER".to_string()],
            vocabulary: StepVocabulary::default(),
            database_url: None,
        }
    }
}

impl EngineConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load through an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let inventory_roles = match lookup(ENV_INVENTORY_ROLES) {
            Some(raw) => {
                let roles = parse_roles(&raw);
                if roles.is_empty() {
                    return Err(ConfigError::Empty {
                        var: ENV_INVENTORY_ROLES,
                    });
                }
                roles
            }
            None => {
                tracing::warn!(
                    var = ENV_INVENTORY_ROLES,
                    roles = ?defaults.inventory_roles,
                    "inventory roles not configured, using defaults"
                );
                defaults.inventory_roles
            }
        };

        let vocabulary = match lookup(ENV_STEP_VOCABULARY) {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: ENV_STEP_VOCABULARY,
                });
            }
            Some(path) => load_vocabulary(PathBuf::from(path.trim()))?,
            None => {
                tracing::warn!(
                    var = ENV_STEP_VOCABULARY,
                    "step vocabulary not configured, using built-in keywords"
                );
                defaults.vocabulary
            }
        };

        let database_url = lookup(ENV_DATABASE_URL).filter(|url| !url.trim().is_empty());
        if database_url.is_none() {
            tracing::warn!(
                var = ENV_DATABASE_URL,
                "no database configured; only the in-memory store is available"
            );
        }

        Ok(Self {
            inventory_roles,
            vocabulary,
            database_url,
        })
    }

    pub fn role_policy(&self) -> RolePolicy {
        RolePolicy::inventory_roles(self.inventory_roles.iter().cloned())
    }

    pub fn classifier(&self) -> StepClassifier {
        StepClassifier::new(self.vocabulary.clone())
    }
}

fn parse_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|r| r.trim().to_uppercase())
        .filter(|r| !r.is_empty())
        .collect()
}

fn load_vocabulary(path: PathBuf) -> Result<StepVocabulary, ConfigError> {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::VocabularyFile { path, source }),
    };
    serde_json::from_str(&raw).map_err(|source| ConfigError::VocabularyFormat { path, source })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use millops_auth::{Permission, Role};
    use millops_inventory::InventoryMode;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());

        let policy = config.role_policy();
        assert!(policy.allows(&Role::WAREHOUSE, &Permission::INVENTORY_ADJUST));
        assert!(!policy.allows(&Role::ADMIN, &Permission::INVENTORY_ADJUST));
    }

    #[test]
    fn roles_are_trimmed_and_upper_cased() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_INVENTORY_ROLES, " warehouse, admin ,,"),
            (ENV_DATABASE_URL, "postgres://localhost/millops"),
        ]))
        .unwrap();
        assert_eq!(config.inventory_roles, vec!["WAREHOUSE", "ADMIN"]);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/millops"));
        assert!(config.role_policy().allows(&Role::ADMIN, &Permission::INVENTORY_ADJUST));
    }

    #[test]
    fn blank_roles_are_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[(ENV_INVENTORY_ROLES, " , ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { var } if var == ENV_INVENTORY_ROLES));
    }

    #[test]
    fn vocabulary_is_read_from_file() {
        let path = std::env::temp_dir().join(format!("millops-vocab-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"issue": ["ship"], "receive": ["restock"]}"#).unwrap();

        let config = EngineConfig::from_lookup(lookup(&[(
            ENV_STEP_VOCABULARY,
            path.to_str().unwrap(),
        )]))
        .unwrap();
        let classifier = config.classifier();
        assert_eq!(classifier.classify("Ship pallets", None), InventoryMode::Issue);
        assert_eq!(classifier.classify("Выдать со склада", None), InventoryMode::NoEffect);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unreadable_or_malformed_vocabulary_is_an_error() {
        let missing = EngineConfig::from_lookup(lookup(&[(
            ENV_STEP_VOCABULARY,
            "/nonexistent/millops/vocabulary.json",
        )]))
        .unwrap_err();
        assert!(matches!(missing, ConfigError::VocabularyFile { .. }));

        let path = std::env::temp_dir().join(format!("millops-bad-vocab-{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap();
        let malformed = EngineConfig::from_lookup(lookup(&[(
            ENV_STEP_VOCABULARY,
            path.to_str().unwrap(),
        )]))
        .unwrap_err();
        assert!(matches!(malformed, ConfigError::VocabularyFormat { .. }));
        std::fs::remove_file(&path).unwrap();
    }
}
