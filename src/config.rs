use crate::generator::ThemeSection;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Prepended to every class name that respects it.
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub important: bool,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub theme: Theme,
    /// Theme section key -> variant names, in the order they are emitted.
    #[serde(default)]
    pub variants: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Theme {
    #[serde(default)]
    pub extend: toml::Table,
    #[serde(flatten)]
    pub sections: toml::Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub message: String,
}

/// Theme with `extend` folded into the base sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedTheme {
    sections: toml::Table,
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|err| ConfigError {
        message: format!("failed to read config {}: {}", path.display(), err),
    })?;
    parse(&text).map_err(|err| ConfigError {
        message: format!("failed to parse config {}: {}", path.display(), err.message),
    })
}

pub fn parse(text: &str) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|err| ConfigError {
        message: err.to_string(),
    })
}

pub fn resolve_theme(config: &Config) -> ResolvedTheme {
    let mut sections = config.theme.sections.clone();

    for (key, extension) in &config.theme.extend {
        match (sections.get_mut(key), extension) {
            (Some(toml::Value::Table(base)), toml::Value::Table(extra)) => {
                for (name, value) in extra {
                    base.insert(name.clone(), value.clone());
                }
            }
            _ => {
                sections.insert(key.clone(), extension.clone());
            }
        }
    }

    ResolvedTheme { sections }
}

impl ResolvedTheme {
    pub fn raw(&self, key: &str) -> Option<&toml::Value> {
        self.sections.get(key)
    }

    /// Flat value name -> CSS value view of one section. Nested tables are
    /// skipped.
    pub fn section(&self, key: &str) -> ThemeSection {
        let Some(toml::Value::Table(table)) = self.sections.get(key) else {
            return ThemeSection::new();
        };

        table
            .iter()
            .filter_map(|(name, value)| match css_value(value) {
                Some(css) => Some((name.clone(), css)),
                None => {
                    log::debug!("skipping non-scalar theme value {}.{}", key, name);
                    None
                }
            })
            .collect()
    }

    /// Responsive breakpoints as (screen name, min width), configured under
    /// `theme.screens`.
    pub fn screens(&self) -> Vec<(String, String)> {
        let screens = self.section("screens");
        if screens.is_empty() {
            return default_screens();
        }
        screens.into_iter().collect()
    }
}

fn css_value(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(text) => Some(text.clone()),
        toml::Value::Integer(number) => Some(number.to_string()),
        toml::Value::Float(number) => Some(number.to_string()),
        toml::Value::Boolean(flag) => Some(flag.to_string()),
        toml::Value::Array(items) => {
            let parts = items.iter().map(css_value).collect::<Option<Vec<_>>>()?;
            Some(parts.join(", "))
        }
        toml::Value::Datetime(_) | toml::Value::Table(_) => None,
    }
}

fn default_separator() -> String {
    ":".to_string()
}

fn default_screens() -> Vec<(String, String)> {
    vec![
        ("sm".to_string(), "640px".to_string()),
        ("md".to_string(), "768px".to_string()),
        ("lg".to_string(), "1024px".to_string()),
        ("xl".to_string(), "1280px".to_string()),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            important: false,
            separator: default_separator(),
            theme: Theme::default(),
            variants: IndexMap::new(),
        }
    }
}
