use crate::utils::error::{ReaperError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional settings file. Every value can also be given on the command line,
/// which takes precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub api: ApiConfig,
    pub reap: ReapConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub skip_ssl_validation: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReapConfig {
    pub service: Option<String>,
    pub age_hours: Option<f64>,
    pub reap: Option<bool>,
    pub recursive: Option<bool>,
    pub page_size: Option<usize>,
}

impl TomlConfig {
    /// Loads settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReaperError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReaperError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references (e.g. `${CF_PASSWORD}`) with environment
    /// values. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReaperError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
url = "https://api.example.com"
username = "admin"
password = "secret"
skip_ssl_validation = true

[reap]
service = "p-config-server"
age_hours = 24.5
reap = true
recursive = false
page_size = 25
"#,
        )
        .unwrap();

        assert_eq!(config.api.url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.api.skip_ssl_validation, Some(true));
        assert_eq!(config.reap.service.as_deref(), Some("p-config-server"));
        assert_eq!(config.reap.age_hours, Some(24.5));
        assert_eq!(config.reap.page_size, Some(25));
    }

    #[test]
    fn test_sections_are_optional() {
        let config = TomlConfig::from_toml_str("[reap]\nservice = \"redis\"\n").unwrap();

        assert!(config.api.url.is_none());
        assert_eq!(config.reap.service.as_deref(), Some("redis"));
        assert!(config.reap.reap.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("INSTANCE_REAPER_TEST_PASSWORD", "from-env");

        let config = TomlConfig::from_toml_str(
            "[api]\npassword = \"${INSTANCE_REAPER_TEST_PASSWORD}\"\nusername = \"${INSTANCE_REAPER_TEST_UNSET}\"\n",
        )
        .unwrap();

        assert_eq!(config.api.password.as_deref(), Some("from-env"));
        assert_eq!(
            config.api.username.as_deref(),
            Some("${INSTANCE_REAPER_TEST_UNSET}")
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = TomlConfig::from_toml_str("[reap]\nplan = \"free\"\n");

        assert!(matches!(result, Err(ReaperError::ConfigError { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nurl = \"https://api.example.com\"").unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();

        assert_eq!(config.api.url.as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn test_missing_file() {
        let result = TomlConfig::from_file("/nonexistent/reaper.toml");

        assert!(matches!(result, Err(ReaperError::IoError(_))));
    }
}
