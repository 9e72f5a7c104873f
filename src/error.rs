use crate::generator::UtilityOptions;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginError {
    #[error(
        "the specified addUtilitiesOptions {} for the custom utility {key} has unacceptable \
         property `variants`. this can be fixed by removing that property from \
         addUtilitiesOptions and instead specifying variants in the `variants` key in \
         `variants.{key}`",
        describe_options(.options)
    )]
    ForbiddenVariants { key: String, options: UtilityOptions },
    #[error("invalid custom utility {key}: {message}")]
    InvalidCustomUtility { key: String, message: String },
}

/// Inline rendering of an options bag, e.g. `{ variants = ["hover"] }`.
pub fn describe_options(options: &UtilityOptions) -> String {
    if options.is_empty() {
        return "{}".to_string();
    }
    let pairs = options
        .iter()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {} }}", pairs)
}

#[cfg(test)]
mod tests {
    use super::{PluginError, describe_options};
    use crate::generator::UtilityOptions;

    #[test]
    fn forbidden_variants_message_names_key_and_options() {
        let mut options = UtilityOptions::new();
        options.insert(
            "variants".to_string(),
            toml::Value::Array(vec![toml::Value::String("hover".to_string())]),
        );
        let err = PluginError::ForbiddenVariants {
            key: "blur".to_string(),
            options,
        };
        let message = err.to_string();
        assert!(message.contains("{ variants = [\"hover\"] }"));
        assert!(message.contains("custom utility blur"));
        assert!(message.contains("`variants.blur`"));
    }

    #[test]
    fn describes_empty_options() {
        assert_eq!(describe_options(&UtilityOptions::new()), "{}");
    }
}
