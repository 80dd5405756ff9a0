//! Configuration management for Quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.base_url`
//! - `content.dir`
//! - `cache.dir`
//! - `theme.dir`
//! - `theme.base_url`

mod expand;

use std::path::{Path, PathBuf};

use quire_cache::{CacheConfig, CacheMode};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override content directory.
    pub content_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override cache mode.
    pub cache_mode: Option<CacheMode>,
    /// Override site base URL.
    pub base_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,
    /// Content configuration (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Cache configuration (paths are relative strings from TOML).
    cache: CacheConfigRaw,
    /// Theme configuration (paths are relative strings from TOML).
    theme: ThemeConfigRaw,
    /// Enabled extensions.
    pub extensions: ExtensionsConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip, default = "CacheConfig::disabled")]
    pub cache_resolved: CacheConfig,
    /// Resolved theme configuration (set after loading).
    #[serde(skip)]
    pub theme_resolved: ThemeConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site-wide settings exposed to templates.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,
    /// URL prefix the site is served under, without trailing slash.
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Quire".to_owned(),
            base_url: String::new(),
        }
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    dir: Option<String>,
    header_open: Option<String>,
    header_close: Option<String>,
}

/// Markers delimiting the header block of a content file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderMarkers {
    /// Two-character open marker; a header is only recognized at file start.
    pub open: String,
    /// Two-character close marker.
    pub close: String,
}

impl Default for HeaderMarkers {
    fn default() -> Self {
        Self {
            open: "/*".to_owned(),
            close: "*/".to_owned(),
        }
    }
}

/// Resolved content configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ContentConfig {
    /// Directory holding the markdown sources.
    pub dir: PathBuf,
    /// Header block markers.
    pub header: HeaderMarkers,
}

/// Raw cache configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
    mode: Option<String>,
}

/// Raw theme configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ThemeConfigRaw {
    name: Option<String>,
    dir: Option<String>,
    base_url: Option<String>,
}

/// Resolved theme configuration.
#[derive(Debug, Default)]
pub struct ThemeConfig {
    /// Theme name.
    pub name: String,
    /// Directory holding the theme's templates (`<themes dir>/<name>`).
    pub dir: PathBuf,
    /// Public URL of the theme directory, without trailing slash.
    pub base_url: String,
}

/// Extension activation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// Extension names in load order.
    pub enabled: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`cache.dir`").
        field: String,
        /// Error message (e.g., "${`CACHE_DIR`} not set").
        message: String,
    },
}

/// Require a marker to be exactly two characters.
fn require_marker(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.chars().count() != 2 {
        return Err(ConfigError::Validation(format!(
            "{field} must be exactly two characters"
        )));
    }
    Ok(())
}

/// Normalize a URL prefix: strip trailing slashes, require a leading one.
fn normalize_base_url(url: &str, field: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim_end_matches('/');
    if !trimmed.is_empty() && !trimmed.starts_with('/') && !trimmed.contains("://") {
        return Err(ConfigError::Validation(format!(
            "{field} must be empty, start with / or be an absolute URL"
        )));
    }
    Ok(trimmed.to_owned())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings)?;
        }

        Ok(config)
    }

    /// Parse configuration from TOML text, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve(base)?;
        config.validate()?;
        Ok(config)
    }

    /// Create default config with paths relative to given base directory.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfig::default(),
            content: ContentConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            theme: ThemeConfigRaw::default(),
            extensions: ExtensionsConfig::default(),
            content_resolved: ContentConfig {
                dir: base.join("content"),
                header: HeaderMarkers::default(),
            },
            cache_resolved: CacheConfig::new(base.join("cache")),
            theme_resolved: ThemeConfig {
                name: "default".to_owned(),
                dir: base.join("themes").join("default"),
                base_url: "/themes/default".to_owned(),
            },
            config_path: None,
        }
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        if let Some(content_dir) = &settings.content_dir {
            self.content_resolved.dir.clone_from(content_dir);
        }
        if let Some(enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = enabled;
        }
        if let Some(mode) = settings.cache_mode {
            self.cache_resolved.mode = mode;
        }
        if let Some(base_url) = &settings.base_url {
            let old_base = std::mem::replace(
                &mut self.site.base_url,
                normalize_base_url(base_url, "--base-url")?,
            );
            // Theme URL follows the base URL unless it was set explicitly.
            if self.theme.base_url.is_none()
                && let Some(rest) = self.theme_resolved.base_url.strip_prefix(&old_base)
            {
                self.theme_resolved.base_url = format!("{}{rest}", self.site.base_url);
            }
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_marker(&self.content_resolved.header.open, "content.header_open")?;
        require_marker(&self.content_resolved.header.close, "content.header_close")?;
        if self.theme_resolved.name.is_empty() {
            return Err(ConfigError::Validation("theme.name cannot be empty".to_owned()));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.base_url = expand::expand_env(&self.site.base_url, "site.base_url")?;

        if let Some(ref dir) = self.content.dir {
            self.content.dir = Some(expand::expand_env(dir, "content.dir")?);
        }
        if let Some(ref dir) = self.cache.dir {
            self.cache.dir = Some(expand::expand_env(dir, "cache.dir")?);
        }
        if let Some(ref dir) = self.theme.dir {
            self.theme.dir = Some(expand::expand_env(dir, "theme.dir")?);
        }
        if let Some(ref url) = self.theme.base_url {
            self.theme.base_url = Some(expand::expand_env(url, "theme.base_url")?);
        }

        Ok(())
    }

    /// Resolve relative paths and derived values against the config directory.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.site.base_url = normalize_base_url(&self.site.base_url, "site.base_url")?;

        let defaults = HeaderMarkers::default();
        self.content_resolved = ContentConfig {
            dir: resolve(self.content.dir.as_deref(), "content"),
            header: HeaderMarkers {
                open: self.content.header_open.clone().unwrap_or(defaults.open),
                close: self.content.header_close.clone().unwrap_or(defaults.close),
            },
        };

        let mode = match self.cache.mode.as_deref() {
            Some(name) => CacheMode::parse(name).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "cache.mode must be one of normal, debug, purge (got {name:?})"
                ))
            })?,
            None => CacheMode::Normal,
        };
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: resolve(self.cache.dir.as_deref(), "cache"),
            mode,
        };

        let name = self.theme.name.clone().unwrap_or_else(|| "default".to_owned());
        let themes_dir = self.theme.dir.as_deref().unwrap_or("themes");
        let base_url = match self.theme.base_url.as_deref() {
            Some(url) => normalize_base_url(url, "theme.base_url")?,
            None => format!(
                "{}/{}/{name}",
                self.site.base_url,
                themes_dir.trim_matches('/')
            ),
        };
        self.theme_resolved = ThemeConfig {
            dir: config_dir.join(themes_dir).join(&name),
            name,
            base_url,
        };

        Ok(())
    }
}
