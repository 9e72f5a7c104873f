use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::PluginError;
use crate::generator::{GeneratedRuleSet, ThemeSection, UtilityOptions, UtilitySpec, generate};
use serde::Deserialize;

/// Theme section holding the discovery table for [`CustomNative::from_theme`].
pub const CUSTOM_UTILITIES_KEY: &str = "customUtilities";

/// Options handed to the host alongside a generated rule set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddUtilitiesOptions {
    pub variants: Vec<String>,
    pub options: UtilityOptions,
}

/// Services the host framework provides to the plugin.
pub trait PluginContext {
    /// Resolved values for a theme section, empty when the section is absent.
    fn theme(&self, key: &str) -> ThemeSection;

    /// Variants configured for a theme section, empty when none are.
    fn variants(&self, key: &str) -> Vec<String>;

    /// Escapes a bare class name for use in a selector.
    fn escape(&self, class_name: &str) -> String;

    fn add_utilities(&mut self, rules: GeneratedRuleSet, options: AddUtilitiesOptions);

    /// Raw `theme.customUtilities` table, if configured.
    fn custom_utilities(&self) -> Option<toml::Value> {
        None
    }
}

/// The accepted ways of describing which utilities to register.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Single(UtilitySpec),
    Multiple(Vec<UtilitySpec>),
    /// Older two-part form: a spec and, separately, its options bag. The bag
    /// replaces whatever options the spec carries.
    Legacy(UtilitySpec, UtilityOptions),
}

impl Call {
    pub fn into_specs(self) -> Vec<UtilitySpec> {
        match self {
            Call::Single(spec) => vec![spec],
            Call::Multiple(specs) => specs,
            Call::Legacy(spec, options) => vec![spec.with_options(options)],
        }
    }
}

impl From<UtilitySpec> for Call {
    fn from(spec: UtilitySpec) -> Self {
        Call::Single(spec)
    }
}

impl From<Vec<UtilitySpec>> for Call {
    fn from(specs: Vec<UtilitySpec>) -> Self {
        Call::Multiple(specs)
    }
}

/// Entry of the `customUtilities` table; the table key is the spec key.
/// Unrecognised keys are ignored.
#[derive(Debug, Clone, Deserialize)]
struct CustomUtilityEntry {
    property: Option<String>,
    rename: Option<String>,
    #[serde(default, rename = "addUtilitiesOptions")]
    add_utilities_options: UtilityOptions,
    /// Only read to point misplaced variant lists at `variants.<key>`.
    variants: Option<toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomNative {
    specs: Vec<UtilitySpec>,
}

impl CustomNative {
    pub fn new(call: impl Into<Call>) -> Self {
        Self {
            specs: call.into().into_specs(),
        }
    }

    /// Builds the spec list from the host's `customUtilities` table.
    pub fn from_theme(ctx: &dyn PluginContext) -> Result<Self, PluginError> {
        let Some(table) = ctx.custom_utilities() else {
            return Ok(Self::default());
        };
        let toml::Value::Table(table) = table else {
            return Err(PluginError::InvalidCustomUtility {
                key: CUSTOM_UTILITIES_KEY.to_string(),
                message: "expected a table of utilities".to_string(),
            });
        };

        let mut specs = Vec::with_capacity(table.len());
        for (key, value) in table {
            let entry: CustomUtilityEntry =
                value
                    .try_into()
                    .map_err(|err: toml::de::Error| PluginError::InvalidCustomUtility {
                        key: key.clone(),
                        message: err.message().to_string(),
                    })?;
            if entry.variants.is_some() {
                return Err(PluginError::InvalidCustomUtility {
                    message: format!(
                        "`variants` does not belong in `theme.customUtilities.{}`; \
                         list them under `variants.{}` instead",
                        key, key
                    ),
                    key,
                });
            }
            specs.push(UtilitySpec {
                key,
                property: entry.property,
                rename: entry.rename,
                pass_through: entry.add_utilities_options,
            });
        }

        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[UtilitySpec] {
        &self.specs
    }

    /// Registers every spec with the host, in order.
    ///
    /// Empty theme sections are reported and skipped. An options bag that sets
    /// `variants` aborts registration before that spec reaches the host.
    pub fn apply(
        &self,
        ctx: &mut dyn PluginContext,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<(), PluginError> {
        if self.specs.is_empty() {
            diagnostics.warn(Diagnostic::NoUtilitiesConfigured);
            return Ok(());
        }

        for spec in &self.specs {
            let section = ctx.theme(&spec.key);
            if section.is_empty() {
                diagnostics.warn(Diagnostic::EmptyThemeSection {
                    key: spec.key.clone(),
                });
                continue;
            }

            if spec.pass_through.contains_key("variants") {
                return Err(PluginError::ForbiddenVariants {
                    key: spec.key.clone(),
                    options: spec.pass_through.clone(),
                });
            }

            let rules = generate(spec, &section, |class_name| ctx.escape(class_name));
            let variants = ctx.variants(&spec.key);
            log::debug!(
                "registering {} utilities for {} with variants {:?}",
                rules.len(),
                spec.key,
                variants
            );
            ctx.add_utilities(
                rules,
                AddUtilitiesOptions {
                    variants,
                    options: spec.pass_through.clone(),
                },
            );
        }

        Ok(())
    }
}

/// Registers each `customUtilities` entry against the host.
pub fn apply_from_theme(
    ctx: &mut dyn PluginContext,
    diagnostics: &mut dyn Diagnostics,
) -> Result<(), PluginError> {
    CustomNative::from_theme(&*ctx)?.apply(ctx, diagnostics)
}
