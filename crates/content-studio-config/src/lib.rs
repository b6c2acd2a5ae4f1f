use content_studio_engine::net::RetryPolicy;
use content_studio_engine::{EmailPlatform, RenderMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_delete_retries() -> u32 {
    3
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one JSON file per composition.
    pub compositions_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheets_path: Option<PathBuf>,
    /// Preview mode to open with instead of the composition type's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<RenderMode>,
    #[serde(default)]
    pub email_platform: EmailPlatform,
    #[serde(default = "default_delete_retries")]
    pub delete_retries: u32,
}

impl Config {
    pub fn new(compositions_path: impl Into<PathBuf>) -> Self {
        Self {
            compositions_path: compositions_path.into(),
            export_path: None,
            stylesheets_path: None,
            default_mode: None,
            email_platform: EmailPlatform::default(),
            delete_retries: default_delete_retries(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in every configured directory
        config.compositions_path =
            Self::expand_path(&config.compositions_path).unwrap_or(config.compositions_path);
        config.export_path = config
            .export_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));
        config.stylesheets_path = config
            .stylesheets_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/content-studio");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Where exports are written; `exports/` under the compositions by default.
    pub fn export_dir(&self) -> PathBuf {
        self.export_path
            .clone()
            .unwrap_or_else(|| self.compositions_path.join("exports"))
    }

    pub fn stylesheets_dir(&self) -> PathBuf {
        self.stylesheets_path
            .clone()
            .unwrap_or_else(|| self.compositions_path.join("stylesheets"))
    }

    pub fn delete_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.delete_retries.max(1))
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/content-studio/config.toml"));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(r#"compositions_path = "/tmp/studio""#).unwrap();

        assert_eq!(config.email_platform, EmailPlatform::Generic);
        assert_eq!(config.default_mode, None);
        assert_eq!(config.delete_retries, 3);
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/studio/exports"));
        assert_eq!(
            config.stylesheets_dir(),
            PathBuf::from("/tmp/studio/stylesheets")
        );
    }

    #[test]
    fn test_modes_and_platforms_parse() {
        let config: Config = toml::from_str(
            r#"
compositions_path = "/tmp/studio"
default_mode = "news-article"
email_platform = "mailchimp"
delete_retries = 5
"#,
        )
        .unwrap();

        assert_eq!(config.default_mode, Some(RenderMode::NewsArticle));
        assert_eq!(config.email_platform, EmailPlatform::Mailchimp);
        assert_eq!(config.delete_retry_policy().max_attempts, 5);
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let mut config = Config::new("/tmp/studio");
        config.delete_retries = 0;
        assert_eq!(config.delete_retry_policy().max_attempts, 1);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_config_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "email_platform = \"carrier-pigeon\"").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::new("/tmp/studio");
        test_config.email_platform = EmailPlatform::SendGrid;
        test_config.export_path = Some(PathBuf::from("/tmp/out"));

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config.compositions_path, test_config.compositions_path);
        assert_eq!(loaded_config.email_platform, EmailPlatform::SendGrid);
        assert_eq!(loaded_config.export_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_config_with_env_var_in_toml() {
        unsafe {
            env::set_var("STUDIO_ROOT", "/custom/studio");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "compositions_path = \"$STUDIO_ROOT/compositions\"\nstylesheets_path = \"$STUDIO_ROOT/css\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(
            config.compositions_path,
            PathBuf::from("/custom/studio/compositions")
        );
        assert_eq!(config.stylesheets_dir(), PathBuf::from("/custom/studio/css"));

        unsafe {
            env::remove_var("STUDIO_ROOT");
        }
    }
}
