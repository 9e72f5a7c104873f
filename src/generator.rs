use crate::naming::{class_body, kebab_case};
use indexmap::IndexMap;

/// Value name -> CSS value, in configuration order.
pub type ThemeSection = IndexMap<String, String>;

/// Opaque options forwarded to the host's `add_utilities`.
pub type UtilityOptions = toml::Table;

/// Escaped class selector (with the leading `.`) -> declaration.
pub type GeneratedRuleSet = IndexMap<String, Declaration>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// One custom utility: which theme section to read and how to name its
/// classes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UtilitySpec {
    pub key: String,
    /// CSS property to emit, `kebab_case(key)` when unset.
    pub property: Option<String>,
    /// Class name prefix, `kebab_case(key)` when unset. `Some("")` drops the
    /// prefix entirely.
    pub rename: Option<String>,
    pub pass_through: UtilityOptions,
}

impl UtilitySpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    pub fn with_options(mut self, options: UtilityOptions) -> Self {
        self.pass_through = options;
        self
    }

    pub fn resolved_property(&self) -> String {
        self.property
            .clone()
            .unwrap_or_else(|| kebab_case(&self.key))
    }

    pub fn resolved_rename(&self) -> String {
        self.rename.clone().unwrap_or_else(|| kebab_case(&self.key))
    }
}

/// Builds one rule per theme entry. `escape` is the host's selector escaping
/// service; it receives the bare class name without the leading `.`.
pub fn generate<F>(spec: &UtilitySpec, section: &ThemeSection, escape: F) -> GeneratedRuleSet
where
    F: Fn(&str) -> String,
{
    let property = spec.resolved_property();
    let rename = spec.resolved_rename();

    section
        .iter()
        .map(|(name, value)| {
            let class_name = class_body(&rename, name);
            let declaration = Declaration {
                property: property.clone(),
                value: value.clone(),
            };
            (format!(".{}", escape(&class_name)), declaration)
        })
        .collect()
}
