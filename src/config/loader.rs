//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/clarion/config.toml)
//! 3. Project config (.clarion/config.toml)
//! 4. Environment variables (CLARION_* prefix, `__` between keys)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{ClarionError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_from(Self::global_config_path().as_deref(), &Self::project_config_path())
    }

    /// Same chain as [`ConfigLoader::load`] with explicit file locations
    pub fn load_from(global: Option<&Path>, project: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // e.g. CLARION_SERVER__PORT -> server.port
        figment = figment.merge(Env::prefixed("CLARION_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ClarionError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ClarionError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/clarion/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("clarion"))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".clarion")
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| ClarionError::Config(e.to_string()))
        }
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;
        println!("{}", Self::render(&config, as_json)?);
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            ClarionError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_template(&global_dir, Self::default_global_config(), force)?;
        Ok(global_dir)
    }

    /// Initialize project configuration in the current directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        Self::write_template(&project_dir, Self::default_project_config(), force)?;
        Ok(project_dir)
    }

    fn write_template(dir: &Path, content: &str, force: bool) -> Result<()> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, content)?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }
        Ok(())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_global_config() -> &'static str {
        r#"# Clarion Global Configuration
# User-wide defaults. Project settings in .clarion/config.toml override these.

version = "1.0"

[server]
port = 2077

[providers]
openai_api_base = "https://api.openai.com/v1"
openrouter_api_base = "https://openrouter.ai/api/v1"

# Credentials are referenced from agent files by `configId`.
# [[credentials]]
# id = "openai-main"
# name = "OpenAI"
# provider = "OpenAI"
# api_key_env = "OPENAI_API_KEY"
"#
    }

    fn default_project_config() -> &'static str {
        r#"# Clarion Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[codebase]
# Directory names skipped in addition to the built-in set
extra_ignore_dirs = []
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::CredentialResolver;
    use crate::config::ConfigCredentialStore;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_from(None, &dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.server.port, 2077);
    }

    #[test]
    fn test_project_overrides_global() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(
            &global,
            "[server]\nport = 3000\n[codebase]\nextra_ignore_dirs = [\"vendor\"]\n",
        )
        .unwrap();
        fs::write(&project, "[server]\nport = 4000\n").unwrap();

        let config = ConfigLoader::load_from(Some(&global), &project).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.codebase.extra_ignore_dirs, vec!["vendor"]);
    }

    #[test]
    fn test_credentials_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[[credentials]]
id = "main"
name = "Main"
provider = "OpenAI"
api_key_env = "OPENAI_API_KEY"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.credentials.len(), 1);
        assert_eq!(config.credentials[0].api_key_env.as_deref(), Some("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_render_redacts_inline_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[credentials]]\nid = \"main\"\nname = \"Main\"\nprovider = \"OpenAI\"\napi_key = \"sk-live-SECRET\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        for as_json in [false, true] {
            let rendered = ConfigLoader::render(&config, as_json).unwrap();
            assert!(!rendered.contains("sk-live-SECRET"), "{}", rendered);
            assert!(rendered.contains("[REDACTED]"));
        }

        let store = ConfigCredentialStore::from_config(&config);
        let record = store.get_config("main").await.unwrap();
        assert_eq!(record.api_key.expose_secret(), "sk-live-SECRET");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = 0\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(ClarionError::Config(_))
        ));
    }

    #[test]
    fn test_env_override() {
        // SAFETY: This test runs in isolation
        unsafe {
            env::set_var("CLARION_PROVIDERS__OPENROUTER_API_BASE", "http://localhost:9000");
        }
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from(None, &dir.path().join("none.toml")).unwrap();
        assert_eq!(config.providers.openrouter_api_base, "http://localhost:9000");
        unsafe {
            env::remove_var("CLARION_PROVIDERS__OPENROUTER_API_BASE");
        }
    }

    #[test]
    fn test_templates_parse() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(&global, ConfigLoader::default_global_config()).unwrap();
        fs::write(&project, ConfigLoader::default_project_config()).unwrap();

        let config = ConfigLoader::load_from(Some(&global), &project).unwrap();
        assert!(config.credentials.is_empty());
        assert!(ConfigLoader::render(&config, false).unwrap().contains("port = 2077"));
    }
}
