use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};
use toml::Value;

use crate::collect::CollectConfig;

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    _config_file_path: Option<PathBuf>,
    selected_section: Option<String>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self { config, _config_file_path: None, selected_section: None }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        let config_paths = discover_config_files()?;
        for path in config_paths {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using empty configuration");
        Ok(Self {
            config: Configuration::new(),
            _config_file_path: None,
            selected_section: None,
        })
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(Self {
            config,
            _config_file_path: Some(path),
            selected_section: None,
        })
    }

    /// Get value from configuration with section fallback
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        // Priority: selected_section -> specified section -> base
        if let Some(selected) = &self.selected_section {
            if let Some(value) = self.config.get(selected).and_then(|s| s.get(key)) {
                return Some(value);
            }
        }

        if let Some(value) = self.config.get(section).and_then(|s| s.get(key)) {
            return Some(value);
        }

        self.config.get("base").and_then(|s| s.get(key))
    }

    /// Select configuration section for --config-name
    pub fn select_section(&mut self, section: String) {
        debug!("Selecting configuration section: {}", section);
        self.selected_section = Some(section);
    }

    /// Get boolean value with type conversion
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!(
                    "Invalid boolean value for {}.{}: {}",
                    section,
                    key,
                    value
                )),
            },
            None => Ok(None),
        }
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// Get a whitespace-separated list value
    pub fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_value(section, key)
            .map(|value| value.split_whitespace().map(str::to_string).collect())
    }

    /// Build collection configuration from the `[collect]` section,
    /// rooted at the given directory
    pub fn get_collect_config(&self, root: PathBuf) -> Result<CollectConfig> {
        let mut config = CollectConfig::new(root);

        if let Some(norecurse) = self.get_list("collect", "norecurse") {
            config.norecurse = norecurse;
        }
        if let Some(patterns) = self.get_list("collect", "file-patterns") {
            config.file_patterns = patterns;
        }
        if let Some(prefix) = self.get_value("collect", "function-prefix") {
            config.function_prefix = prefix.clone();
        }
        if let Some(prefix) = self.get_value("collect", "class-prefix") {
            config.class_prefix = prefix.clone();
        }

        config
            .validate()
            .with_context(|| "Collection configuration validation failed")?;
        Ok(config)
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    // 1. Environment variable $TCOLLECT_CONFIG
    if let Ok(env_path) = env::var("TCOLLECT_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tcollect").join("config.toml"));
    }

    // 3. Home directory
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".tcollect.toml"));
    }

    // 4. Project local
    paths.push(PathBuf::from("./.tcollect.toml"));

    debug!("Config discovery paths: {:?}", paths);
    Ok(paths)
}

/// Parse TOML content to string-based configuration
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let toml_value: Value = content.parse().context("Failed to parse TOML content")?;

    let mut config = Configuration::new();
    if let Value::Table(table) = toml_value {
        flatten_toml_table(&table, String::new(), &mut config);
    }

    debug!("Parsed configuration: {:?}", config);
    Ok(config)
}

/// Recursively flatten TOML tables into section.subsection format
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        let section_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(subtable) => {
                if subtable.values().all(|v| !matches!(v, Value::Table(_))) {
                    // Leaf table (configuration section)
                    let mut section_map = HashMap::new();
                    for (subkey, subvalue) in subtable {
                        section_map.insert(subkey.clone(), toml_value_to_string(subvalue));
                    }
                    config.insert(section_name, section_map);
                } else {
                    flatten_toml_table(subtable, section_name, config);
                }
            }
            _ => {
                // Direct key-value pair (e.g., in [base] section)
                let mut section_map = HashMap::new();
                section_map.insert("value".to_string(), toml_value_to_string(value));
                config.insert(section_name, section_map);
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_value_to_string_conversion() {
        assert_eq!(toml_value_to_string(&Value::String("test".to_string())), "test");
        assert_eq!(toml_value_to_string(&Value::Integer(42)), "42");
        assert_eq!(toml_value_to_string(&Value::Boolean(true)), "true");
        assert_eq!(toml_value_to_string(&Value::Boolean(false)), "false");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
[base]
quiet = true
log-format = "json"

[collect]
norecurse = "mydir xyz*"
function-prefix = "check"
"#;

        let config = parse_toml_config(toml_content).unwrap();

        assert_eq!(config.get("base").unwrap().get("quiet").unwrap(), "true");
        assert_eq!(config.get("base").unwrap().get("log-format").unwrap(), "json");
        assert_eq!(config.get("collect").unwrap().get("norecurse").unwrap(), "mydir xyz*");
        assert_eq!(config.get("collect").unwrap().get("function-prefix").unwrap(), "check");
    }

    #[test]
    fn test_config_manager_value_retrieval() {
        let mut config = Configuration::new();

        let mut base_section = HashMap::new();
        base_section.insert("quiet".to_string(), "true".to_string());
        base_section.insert("log-format".to_string(), "text".to_string());
        config.insert("base".to_string(), base_section);

        let mut collect_section = HashMap::new();
        collect_section.insert("log-format".to_string(), "json".to_string());
        config.insert("collect".to_string(), collect_section);

        let manager = ConfigManager::from_config(config);

        // Section value overrides base, missing keys fall back
        assert_eq!(manager.get_value("collect", "log-format").unwrap(), "json");
        assert_eq!(manager.get_value("collect", "quiet").unwrap(), "true");
        assert!(manager.get_value("collect", "missing").is_none());
    }

    #[test]
    fn test_selected_section_takes_priority() {
        let mut config = Configuration::new();

        let mut collect_section = HashMap::new();
        collect_section.insert("function-prefix".to_string(), "test".to_string());
        config.insert("collect".to_string(), collect_section);

        let mut alt_section = HashMap::new();
        alt_section.insert("function-prefix".to_string(), "check".to_string());
        config.insert("alt".to_string(), alt_section);

        let mut manager = ConfigManager::from_config(config);
        assert_eq!(manager.get_value("collect", "function-prefix").unwrap(), "test");

        manager.select_section("alt".to_string());
        assert_eq!(manager.get_value("collect", "function-prefix").unwrap(), "check");
    }

    #[test]
    fn test_get_collect_config_from_section() {
        let mut config = Configuration::new();
        let mut collect_section = HashMap::new();
        collect_section.insert("norecurse".to_string(), "mydir xyz*".to_string());
        collect_section.insert("file-patterns".to_string(), "test_*.py *_test.py".to_string());
        collect_section.insert("class-prefix".to_string(), "Check".to_string());
        config.insert("collect".to_string(), collect_section);

        let manager = ConfigManager::from_config(config);
        let collect = manager.get_collect_config(PathBuf::from("/tmp")).unwrap();

        assert_eq!(collect.root, PathBuf::from("/tmp"));
        assert_eq!(collect.norecurse, vec!["mydir".to_string(), "xyz*".to_string()]);
        assert_eq!(collect.class_prefix, "Check");
        assert_eq!(collect.function_prefix, "test");
    }

    #[test]
    fn test_get_bool_conversion() {
        let mut config = Configuration::new();
        let mut base = HashMap::new();
        base.insert("quiet".to_string(), "true".to_string());
        base.insert("broken".to_string(), "maybe".to_string());
        config.insert("base".to_string(), base);

        let manager = ConfigManager::from_config(config);
        assert_eq!(manager.get_bool("base", "quiet").unwrap(), Some(true));
        assert_eq!(manager.get_bool("base", "missing").unwrap(), None);
        assert!(manager.get_bool("base", "broken").is_err());
    }
}
