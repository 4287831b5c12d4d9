// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Engine configuration.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LoaderError, Result};

/// Default suffix appended to extension-less specifiers.
pub const DEFAULT_MODULE_EXTENSION: &str = ".js";

/// Default file tried when a specifier names a directory.
pub const DEFAULT_DIRECTORY_INDEX: &str = "index.js";

/// Prefix of the environment variables read by [`EngineConfig::load`].
pub const ENV_PREFIX: &str = "COMMONRS_";

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root directories searched for absolute and bare specifiers, first match wins
    #[serde(deserialize_with = "one_or_many")]
    pub base_paths: Vec<PathBuf>,

    /// Suffix appended to specifiers that do not already carry it
    pub module_extension: String,

    /// File tried when a specifier resolves to a directory
    pub directory_index_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_paths: vec![std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))],
            module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
            directory_index_name: DEFAULT_DIRECTORY_INDEX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration rooted at a single base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_paths: vec![base_path.into()],
            ..Self::default()
        }
    }

    /// Replace the base paths.
    pub fn with_base_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.base_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the module extension.
    pub fn with_module_extension(mut self, extension: impl Into<String>) -> Self {
        self.module_extension = extension.into();
        self
    }

    /// Replace the directory index file name.
    pub fn with_directory_index_name(mut self, name: impl Into<String>) -> Self {
        self.directory_index_name = name.into();
        self
    }

    /// Load configuration from default locations.
    ///
    /// Later sources override earlier ones: defaults, the user config file,
    /// `./commonrs.toml`, then `COMMONRS_*` environment variables.
    pub fn load() -> Result<Self> {
        let mut config = EngineConfig::default();

        if let Some(user_config_path) = user_config_path() {
            if user_config_path.exists() {
                config.merge_from_file(&user_config_path)?;
            }
        }

        let project_config = PathBuf::from("commonrs.toml");
        if project_config.exists() {
            config.merge_from_file(&project_config)?;
        }

        config.merge_env(std::env::vars())?;

        Ok(config)
    }

    /// Read a configuration file, starting from defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML document, starting from defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge the keys present in a TOML file into this configuration.
    pub fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content)?;
        debug!(path = %path.display(), "merging config file");

        for (key, value) in table {
            match (key.as_str(), value) {
                ("base_paths", toml::Value::String(path)) => {
                    self.base_paths = vec![PathBuf::from(path)];
                }
                ("base_paths", toml::Value::Array(items)) => {
                    self.base_paths = items
                        .into_iter()
                        .map(|item| match item {
                            toml::Value::String(path) => Ok(PathBuf::from(path)),
                            other => Err(LoaderError::Config(format!(
                                "base_paths entries must be strings, got {}",
                                other.type_str()
                            ))),
                        })
                        .collect::<Result<_>>()?;
                }
                ("module_extension", toml::Value::String(ext)) => self.module_extension = ext,
                ("directory_index_name", toml::Value::String(name)) => {
                    self.directory_index_name = name
                }
                (key, value) => {
                    return Err(LoaderError::Config(format!(
                        "unsupported key '{}' ({}) in {}",
                        key,
                        value.type_str(),
                        path.display()
                    )));
                }
            }
        }

        self.validate()
    }

    /// Apply `COMMONRS_*` variables from `vars`, then validate the result.
    ///
    /// `COMMONRS_MODULE_EXTENSION=.mjs` maps to the `module-extension` key.
    pub fn merge_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                let config_key = config_key.to_lowercase().replace('_', "-");
                self.set(&config_key, &value);
            }
        }
        self.validate()
    }

    /// Set a configuration value by its dashed key name.
    ///
    /// `base-paths` is split on the platform path-list separator. Unknown keys
    /// are ignored.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "base-paths" | "base-path" => {
                self.base_paths = std::env::split_paths(value).collect();
            }
            "module-extension" => self.module_extension = value.to_string(),
            "directory-index" | "directory-index-name" => {
                self.directory_index_name = value.to_string()
            }
            _ => debug!(key, "ignoring unknown config key"),
        }
    }

    /// Get a configuration value by its dashed key name.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "base-paths" | "base-path" => std::env::join_paths(&self.base_paths)
                .ok()
                .map(|joined| joined.to_string_lossy().into_owned()),
            "module-extension" => Some(self.module_extension.clone()),
            "directory-index" | "directory-index-name" => Some(self.directory_index_name.clone()),
            _ => None,
        }
    }

    /// Check the configuration for values the resolver cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.directory_index_name.is_empty() {
            return Err(LoaderError::Config(
                "directory_index_name must not be empty".into(),
            ));
        }
        if self.directory_index_name.contains(['/', '\\']) {
            return Err(LoaderError::Config(format!(
                "directory_index_name '{}' must be a plain file name",
                self.directory_index_name
            )));
        }
        Ok(())
    }
}

/// Get the user config path.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("commonrs").join("config.toml"))
}

/// Accept either `base_paths = "dir"` or `base_paths = ["a", "b"]`.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("/srv/app");
        assert_eq!(config.base_paths, vec![PathBuf::from("/srv/app")]);
        assert_eq!(config.module_extension, ".js");
        assert_eq!(config.directory_index_name, "index.js");
    }

    #[test]
    fn test_single_base_path_in_toml() {
        let config = EngineConfig::from_toml_str(r#"base_paths = "/srv/app""#).unwrap();
        assert_eq!(config.base_paths, vec![PathBuf::from("/srv/app")]);
        assert_eq!(config.module_extension, DEFAULT_MODULE_EXTENSION);
    }

    #[test]
    fn test_base_path_list_in_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            base_paths = ["/srv/first", "/srv/second"]
            module_extension = ".inc"
            directory_index_name = "main.inc"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.base_paths,
            vec![PathBuf::from("/srv/first"), PathBuf::from("/srv/second")]
        );
        assert_eq!(config.module_extension, ".inc");
        assert_eq!(config.directory_index_name, "main.inc");
    }

    #[test]
    fn test_merge_from_file_keeps_unset_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commonrs.toml");
        std::fs::write(&path, "module_extension = \".mod\"\n").unwrap();

        let mut config = EngineConfig::new("/srv/app");
        config.merge_from_file(&path).unwrap();
        assert_eq!(config.module_extension, ".mod");
        assert_eq!(config.base_paths, vec![PathBuf::from("/srv/app")]);
    }

    #[test]
    fn test_merge_rejects_unknown_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commonrs.toml");
        std::fs::write(&path, "module_ext = \".mod\"\n").unwrap();

        let mut config = EngineConfig::new("/srv/app");
        assert!(matches!(
            config.merge_from_file(&path),
            Err(LoaderError::Config(_))
        ));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = EngineConfig::new("/srv/app");
        config.set("module-extension", ".inc");
        config.set("directory-index", "main.inc");
        config.set("no-such-key", "ignored");
        assert_eq!(config.get("module-extension").as_deref(), Some(".inc"));
        assert_eq!(config.get("directory-index").as_deref(), Some("main.inc"));
        assert_eq!(config.get("base-paths").as_deref(), Some("/srv/app"));
        assert_eq!(config.get("no-such-key"), None);
    }

    fn env(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commonrs.toml");
        std::fs::write(
            &path,
            "module_extension = \".inc\"\ndirectory_index_name = \"main.inc\"\n",
        )
        .unwrap();

        let mut config = EngineConfig::new("/srv/app");
        config.merge_from_file(&path).unwrap();
        config
            .merge_env(env(&[
                ("COMMONRS_MODULE_EXTENSION", ".mjs"),
                ("HOME", "/root"),
            ]))
            .unwrap();

        assert_eq!(config.module_extension, ".mjs");
        assert_eq!(config.directory_index_name, "main.inc");
        assert_eq!(config.base_paths, vec![PathBuf::from("/srv/app")]);
    }

    #[test]
    fn test_env_base_paths() {
        let mut config = EngineConfig::new("/srv/app");
        let joined = std::env::join_paths(["/srv/first", "/srv/second"]).unwrap();
        config
            .merge_env(vec![(
                "COMMONRS_BASE_PATHS".to_string(),
                joined.to_string_lossy().into_owned(),
            )])
            .unwrap();
        assert_eq!(
            config.base_paths,
            vec![PathBuf::from("/srv/first"), PathBuf::from("/srv/second")]
        );
    }

    #[test]
    fn test_env_values_are_validated() {
        let mut config = EngineConfig::new("/srv/app");
        let result = config.merge_env(env(&[("COMMONRS_DIRECTORY_INDEX", "lib/index.js")]));
        assert!(matches!(result, Err(LoaderError::Config(_))));
    }

    #[test]
    fn test_index_name_must_be_a_file_name() {
        let config = EngineConfig::new("/srv/app").with_directory_index_name("lib/index.js");
        assert!(config.validate().is_err());
    }
}
