use crate::config::{Config, ResolvedTheme, resolve_theme};
use crate::generator::{Declaration, GeneratedRuleSet, ThemeSection};
use crate::plugin::{AddUtilitiesOptions, CUSTOM_UTILITIES_KEY, PluginContext};

const RESPONSIVE_VARIANT: &str = "responsive";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub message: String,
}

/// Minimal host backed by a loaded [`Config`]: resolves theme sections and
/// variants, collects registered utilities and renders them to CSS.
#[derive(Debug, Clone)]
pub struct ConfigHost<'a> {
    config: &'a Config,
    theme: ResolvedTheme,
    groups: Vec<UtilityGroup>,
}

#[derive(Debug, Clone)]
struct UtilityGroup {
    rules: GeneratedRuleSet,
    variants: Vec<String>,
    respect_prefix: bool,
    respect_important: bool,
}

impl<'a> ConfigHost<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            theme: resolve_theme(config),
            groups: Vec::new(),
        }
    }

    /// Number of registered rules before variant expansion.
    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|group| group.rules.len()).sum()
    }

    /// Renders every registered group: base rules followed by their
    /// variants, then one media block per screen for responsive groups.
    pub fn emit_css(&self, minify: bool) -> Result<String, HostError> {
        let mut blocks = Vec::new();
        let mut responsive = Vec::new();

        for group in &self.groups {
            let rendered = self.render_group(group, None, minify)?;
            if group.variants.iter().any(|v| v == RESPONSIVE_VARIANT) {
                responsive.push(group);
            }
            blocks.extend(rendered);
        }

        if !responsive.is_empty() {
            for (screen, width) in self.theme.screens() {
                let mut screen_rules = Vec::new();
                for group in &responsive {
                    screen_rules.extend(self.render_group(group, Some(&screen), minify)?);
                }
                let query = format!("(min-width: {})", width);
                blocks.push(wrap_media(&query, &screen_rules.join(joiner(minify)), minify));
            }
        }

        Ok(blocks.join(joiner(minify)))
    }

    fn render_group(
        &self,
        group: &UtilityGroup,
        screen: Option<&str>,
        minify: bool,
    ) -> Result<Vec<String>, HostError> {
        let mut out = Vec::new();

        for (selector, declaration) in &group.rules {
            let class = self.class_for(selector, group.respect_prefix, screen);
            out.push(self.render_rule(&format!(".{}", class), declaration, group, minify));
        }

        for variant in &group.variants {
            if variant == RESPONSIVE_VARIANT {
                continue;
            }
            for (selector, declaration) in &group.rules {
                let class = self.class_for(selector, group.respect_prefix, None);
                let variant_class = format!(
                    "{}{}{}",
                    escape_selector(variant),
                    escape_selector(&self.config.separator),
                    class
                );
                let variant_class = match screen {
                    Some(screen) => self.screen_class(screen, &variant_class),
                    None => variant_class,
                };
                let variant_selector = selector_for_variant(variant, &variant_class)
                    .ok_or_else(|| HostError {
                        message: format!(
                            "the `{}` variant is not supported; supported variants are \
                             responsive, group-hover, group-focus and pseudo-classes such as hover",
                            variant
                        ),
                    })?;
                out.push(self.render_rule(&variant_selector, declaration, group, minify));
            }
        }

        Ok(out)
    }

    /// Escaped class name (no leading `.`) for a generated selector, with the
    /// configured prefix and screen applied.
    fn class_for(&self, selector: &str, respect_prefix: bool, screen: Option<&str>) -> String {
        let class = selector.strip_prefix('.').unwrap_or(selector);
        let class = if respect_prefix && !self.config.prefix.is_empty() {
            let prefix = escape_selector(&self.config.prefix);
            match class.strip_prefix('-') {
                Some(positive) => format!("-{}{}", prefix, positive),
                None => format!("{}{}", prefix, class),
            }
        } else {
            class.to_string()
        };
        match screen {
            Some(screen) => self.screen_class(screen, &class),
            None => class,
        }
    }

    fn screen_class(&self, screen: &str, class: &str) -> String {
        format!(
            "{}{}{}",
            escape_selector(screen),
            escape_selector(&self.config.separator),
            class
        )
    }

    fn render_rule(
        &self,
        selector: &str,
        declaration: &Declaration,
        group: &UtilityGroup,
        minify: bool,
    ) -> String {
        let important = self.config.important && group.respect_important;
        let value = if important {
            format!("{} !important", declaration.value)
        } else {
            declaration.value.clone()
        };
        if minify {
            format!("{}{{{}:{}}}", selector, declaration.property, value)
        } else {
            format!("{} {{\n  {}: {};\n}}", selector, declaration.property, value)
        }
    }
}

impl PluginContext for ConfigHost<'_> {
    fn theme(&self, key: &str) -> ThemeSection {
        self.theme.section(key)
    }

    fn variants(&self, key: &str) -> Vec<String> {
        self.config.variants.get(key).cloned().unwrap_or_default()
    }

    fn escape(&self, class_name: &str) -> String {
        escape_selector(class_name)
    }

    fn add_utilities(&mut self, rules: GeneratedRuleSet, options: AddUtilitiesOptions) {
        let flag = |name: &str| {
            options
                .options
                .get(name)
                .and_then(toml::Value::as_bool)
                .unwrap_or(true)
        };
        let group = UtilityGroup {
            respect_prefix: flag("respectPrefix"),
            respect_important: flag("respectImportant"),
            variants: options.variants,
            rules,
        };
        log::debug!(
            "host received {} rules with variants {:?}",
            group.rules.len(),
            group.variants
        );
        self.groups.push(group);
    }

    fn custom_utilities(&self) -> Option<toml::Value> {
        self.theme.raw(CUSTOM_UTILITIES_KEY).cloned()
    }
}

/// Escapes a class name for use after `.` in a selector. Leading digits (and
/// a digit right after a leading `-`) become code point escapes.
pub fn escape_selector(class: &str) -> String {
    if class == "-" {
        return "\\-".to_string();
    }

    let mut escaped = String::with_capacity(class.len() * 2);
    let starts_with_dash = class.starts_with('-');

    for (idx, ch) in class.chars().enumerate() {
        if ch.is_ascii_digit() && (idx == 0 || (idx == 1 && starts_with_dash)) {
            escaped.push_str(&format!("\\{:x} ", ch as u32));
            continue;
        }
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            '/' => escaped.push_str("\\/"),
            '[' => escaped.push_str("\\["),
            ']' => escaped.push_str("\\]"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '&' => escaped.push_str("\\&"),
            '>' => escaped.push_str("\\>"),
            '<' => escaped.push_str("\\<"),
            '+' => escaped.push_str("\\+"),
            '~' => escaped.push_str("\\~"),
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            '%' => escaped.push_str("\\%"),
            '=' => escaped.push_str("\\="),
            '!' => escaped.push_str("\\!"),
            '?' => escaped.push_str("\\?"),
            '*' => escaped.push_str("\\*"),
            '@' => escaped.push_str("\\@"),
            '#' => escaped.push_str("\\#"),
            '$' => escaped.push_str("\\$"),
            '^' => escaped.push_str("\\^"),
            '|' => escaped.push_str("\\|"),
            '`' => escaped.push_str("\\`"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '.' => escaped.push_str("\\."),
            ' ' => escaped.push_str("\\ "),
            _ => escaped.push(ch),
        }
    }

    escaped
}

/// Full selector for `class` (already escaped and variant-prefixed) under
/// one variant.
fn selector_for_variant(variant: &str, class: &str) -> Option<String> {
    let selector = match variant {
        "group-hover" => format!(".group:hover .{}", class),
        "group-focus" => format!(".group:focus .{}", class),
        _ => format!(".{}{}", class, pseudo_class_for_variant(variant)?),
    };
    Some(selector)
}

fn pseudo_class_for_variant(variant: &str) -> Option<&'static str> {
    let suffix = match variant {
        "hover" => ":hover",
        "focus" => ":focus",
        "focus-within" => ":focus-within",
        "focus-visible" => ":focus-visible",
        "active" => ":active",
        "visited" => ":visited",
        "target" => ":target",
        "first" => ":first-child",
        "last" => ":last-child",
        "only" => ":only-child",
        "odd" => ":nth-child(odd)",
        "even" => ":nth-child(even)",
        "first-of-type" => ":first-of-type",
        "last-of-type" => ":last-of-type",
        "empty" => ":empty",
        "disabled" => ":disabled",
        "enabled" => ":enabled",
        "checked" => ":checked",
        "required" => ":required",
        "invalid" => ":invalid",
        "placeholder-shown" => ":placeholder-shown",
        "read-only" => ":read-only",
        "before" => "::before",
        "after" => "::after",
        "first-letter" => "::first-letter",
        "first-line" => "::first-line",
        "selection" => "::selection",
        "placeholder" => "::placeholder",
        _ => return None,
    };
    Some(suffix)
}

fn joiner(minify: bool) -> &'static str {
    if minify { "" } else { "\n" }
}

fn wrap_media(query: &str, rules: &str, minify: bool) -> String {
    if minify {
        format!("@media {}{{{}}}", query, rules)
    } else {
        format!("@media {} {{\n{}\n}}", query, indent_css_block(rules, 2))
    }
}

fn indent_css_block(css: &str, spaces: usize) -> String {
    let padding = " ".repeat(spaces);
    css.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", padding, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{ConfigHost, escape_selector};
    use crate::config::{Config, parse};
    use crate::diagnostics::Diagnostic;
    use crate::plugin::apply_from_theme;
    use pretty_assertions::assert_eq;

    fn build_css(config: &Config, minify: bool) -> String {
        let mut host = ConfigHost::new(config);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        apply_from_theme(&mut host, &mut diagnostics).expect("utilities should register");
        host.emit_css(minify).expect("css should render")
    }

    #[test]
    fn escapes_selector_characters() {
        assert_eq!(escape_selector("scale-y-0%"), "scale-y-0\\%");
        assert_eq!(escape_selector("-scale-x-0.5"), "-scale-x-0\\.5");
        assert_eq!(escape_selector("hover:x"), "hover\\:x");
        assert_eq!(escape_selector("w-1/2"), "w-1\\/2");
    }

    #[test]
    fn escapes_leading_digits() {
        assert_eq!(escape_selector("2xl"), "\\32 xl");
        assert_eq!(escape_selector("-4"), "-\\34 ");
        assert_eq!(escape_selector("-"), "\\-");
        assert_eq!(escape_selector("a4"), "a4");
    }

    #[test]
    fn renders_pseudo_class_variants_after_base_rules() {
        let config = parse(
            r#"
[theme.mixBlendMode]
screen = "screen"
overlay = "overlay"

[theme.customUtilities]
mixBlendMode = {}

[variants]
mixBlendMode = ["hover", "focus"]
"#,
        )
        .expect("config should parse");

        let css = build_css(&config, true);
        assert_eq!(
            css,
            ".mix-blend-mode-screen{mix-blend-mode:screen}\
             .mix-blend-mode-overlay{mix-blend-mode:overlay}\
             .hover\\:mix-blend-mode-screen:hover{mix-blend-mode:screen}\
             .hover\\:mix-blend-mode-overlay:hover{mix-blend-mode:overlay}\
             .focus\\:mix-blend-mode-screen:focus{mix-blend-mode:screen}\
             .focus\\:mix-blend-mode-overlay:focus{mix-blend-mode:overlay}"
        );
    }

    #[test]
    fn renders_responsive_variants_per_screen() {
        let config = parse(
            r#"
[theme.extend.customUtilities]
filter = { rename = "" }

[theme.extend.filter]
grayscale = "grayscale(100%)"

[theme.screens]
sm = "640px"
md = "768px"

[variants]
filter = ["responsive"]
"#,
        )
        .expect("config should parse");

        let css = build_css(&config, true);
        assert_eq!(
            css,
            ".grayscale{filter:grayscale(100%)}\
             @media (min-width: 640px){.sm\\:grayscale{filter:grayscale(100%)}}\
             @media (min-width: 768px){.md\\:grayscale{filter:grayscale(100%)}}"
        );
    }

    #[test]
    fn renders_group_hover_and_nth_child_variants() {
        let config = parse(
            r#"
[theme.customUtilities]
tracking = { rename = "letter-spacing" }

[theme.tracking]
"-1" = "-1px"

[variants]
tracking = ["even", "group-hover"]
"#,
        )
        .expect("config should parse");

        let css = build_css(&config, true);
        assert_eq!(
            css,
            ".-letter-spacing-1{tracking:-1px}\
             .even\\:-letter-spacing-1:nth-child(even){tracking:-1px}\
             .group:hover .group-hover\\:-letter-spacing-1{tracking:-1px}"
        );
    }

    #[test]
    fn pretty_output_indents_declarations() {
        let config = parse(
            r#"
[theme.customUtilities]
scrollBehavior = { rename = "scroll" }

[theme.scrollBehavior]
smoothly = "smooth"
"#,
        )
        .expect("config should parse");

        assert_eq!(
            build_css(&config, false),
            ".scroll-smoothly {\n  scroll-behavior: smooth;\n}"
        );
    }

    #[test]
    fn applies_prefix_and_important_unless_opted_out() {
        let config = parse(
            r#"
prefix = "tw-"
important = true

[theme.customUtilities]
margin = { rename = "m" }
content = { addUtilitiesOptions = { respectPrefix = false, respectImportant = false } }

[theme.margin]
"-2" = "-0.5rem"

[theme.content]
empty = "''"
"#,
        )
        .expect("config should parse");

        let css = build_css(&config, true);
        assert_eq!(
            css,
            ".-tw-m-2{margin:-0.5rem !important}.content-empty{content:''}"
        );
    }

    #[test]
    fn unknown_variant_is_a_host_error() {
        let config = parse(
            r#"
[theme.customUtilities]
opacity = {}

[theme.opacity]
50 = "0.5"

[variants]
opacity = ["wiggle"]
"#,
        )
        .expect("config should parse");

        let mut host = ConfigHost::new(&config);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        apply_from_theme(&mut host, &mut diagnostics).expect("utilities should register");
        let err = host.emit_css(true).expect_err("wiggle is not a variant");
        assert!(err.message.contains("`wiggle`"));
        assert_eq!(host.rule_count(), 1);
    }
}
