use std::fmt;

/// Non-fatal configuration problems reported while registering utilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    NoUtilitiesConfigured,
    EmptyThemeSection { key: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoUtilitiesConfigured => f.write_str(
                "the custom-native plugin does not have any configuration, so no utilities \
                 can/will be generated; this can be fixed by putting something like \
                 `keyName = {}` in `theme.customUtilities`",
            ),
            Diagnostic::EmptyThemeSection { key } => write!(
                f,
                "the custom utility {} does not have any configuration in `theme`, so no \
                 classes can/will be generated for this utility",
                key
            ),
        }
    }
}

pub trait Diagnostics {
    fn warn(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `log::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
    }
}

impl Diagnostics for Vec<Diagnostic> {
    fn warn(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, Diagnostics};

    #[test]
    fn empty_section_message_names_the_key() {
        let message = Diagnostic::EmptyThemeSection {
            key: "mixBlendMode".to_string(),
        }
        .to_string();
        assert!(message.contains("custom utility mixBlendMode"));
        assert!(message.contains("`theme`"));
    }

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink = Vec::new();
        sink.warn(Diagnostic::NoUtilitiesConfigured);
        sink.warn(Diagnostic::EmptyThemeSection {
            key: "blur".to_string(),
        });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0], Diagnostic::NoUtilitiesConfigured);
    }
}
