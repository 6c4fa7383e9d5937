use crate::backend::OpendalBackend;
use crate::error::{FormError, Result};
use crate::storage;
use crate::store::FormStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_forms_path() -> String {
    "forms".to_string()
}

fn default_backend_root() -> String {
    "tables".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormsLocation {
    pub uri: String,
    #[serde(default = "default_forms_path")]
    pub path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackendLocation {
    pub uri: String,
    #[serde(default = "default_backend_root")]
    pub root: String,
}

/// Where descriptor files live and where the table backend keeps its data.
///
/// ```yaml
/// forms:
///   uri: file:///srv/app
///   path: forms
/// backend:
///   uri: memory://app
///   root: tables
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormsConfig {
    pub forms: FormsLocation,
    pub backend: BackendLocation,
}

impl FormsConfig {
    pub fn new(forms_uri: &str, backend_uri: &str) -> Self {
        Self {
            forms: FormsLocation {
                uri: forms_uri.to_string(),
                path: default_forms_path(),
            },
            backend: BackendLocation {
                uri: backend_uri.to_string(),
                root: default_backend_root(),
            },
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| FormError::config("cannot parse YAML", e))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FormError::config(format!("cannot read {}", path.display()), e))?;
        Self::from_yaml_str(&content)
    }

    pub fn form_store(&self) -> Result<FormStore> {
        let op = storage::operator_from_uri(&self.forms.uri)
            .map_err(|e| FormError::config(format!("forms uri {}", self.forms.uri), e))?;
        Ok(FormStore::new(op, &self.forms.path))
    }

    pub fn backend(&self) -> Result<OpendalBackend> {
        let op = storage::operator_from_uri(&self.backend.uri)
            .map_err(|e| FormError::config(format!("backend uri {}", self.backend.uri), e))?;
        Ok(OpendalBackend::new(op, &self.backend.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_default_paths() {
        let config = FormsConfig::from_yaml_str(
            "forms:\n  uri: memory://cfg\nbackend:\n  uri: memory://cfg-db\n",
        )
        .unwrap();
        assert_eq!(config, FormsConfig::new("memory://cfg", "memory://cfg-db"));
        assert_eq!(config.forms.path, "forms");
        assert_eq!(config.backend.root, "tables");
    }

    #[test]
    fn yaml_without_backend_is_rejected() {
        let err = FormsConfig::from_yaml_str("forms:\n  uri: memory://x\n").unwrap_err();
        assert!(matches!(err, FormError::Config { .. }));
    }

    #[test]
    fn parse_errors_keep_their_cause() {
        use std::error::Error as _;

        let err = FormsConfig::from_yaml_str("forms: [").unwrap_err();
        assert_eq!(err.to_string(), "invalid config: cannot parse YAML");
        let cause = err.source().expect("yaml error kept as source");
        assert!(cause.downcast_ref::<serde_yaml::Error>().is_some());
    }

    #[test]
    fn unknown_uri_scheme_is_a_config_error() {
        use std::error::Error as _;

        let config = FormsConfig::new("nosuchscheme://x", "memory://cfg-db");
        let err = config.form_store().unwrap_err();
        assert!(err.to_string().contains("forms uri nosuchscheme://x"));
        assert!(err.source().is_some());
    }
}
