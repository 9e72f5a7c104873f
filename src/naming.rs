/// Converts an identifier such as `mixBlendMode` or `list_style image` into
/// `mix-blend-mode` / `list-style-image`.
///
/// Words break on any non-alphanumeric character, on a lower-to-upper case
/// change, before the last capital of an acronym (`XMLHttp` -> `xml-http`) and
/// between letters and digits (`h1` -> `h-1`).
pub fn kebab_case(input: &str) -> String {
    words(input)
        .into_iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (idx, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let next = chars.get(idx + 1).copied();
            if starts_new_word(prev, ch, next) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn starts_new_word(prev: char, ch: char, next: Option<char>) -> bool {
    if prev.is_numeric() != ch.is_numeric() {
        return true;
    }
    if prev.is_lowercase() && ch.is_uppercase() {
        return true;
    }
    prev.is_uppercase() && ch.is_uppercase() && next.is_some_and(char::is_lowercase)
}

/// Joins `base` and `modifier` with `-`, moving a leading `-` of the modifier
/// to the front: (`scale-y`, `-50%`) -> `-scale-y-50%`.
pub fn prefix_negative_modifiers(base: &str, modifier: &str) -> String {
    match modifier.strip_prefix('-') {
        Some(positive) => format!("-{}-{}", base, positive),
        None => format!("{}-{}", base, modifier),
    }
}

/// Unescaped class name for one theme entry. An empty `rename` uses the value
/// name as-is.
pub fn class_body(rename: &str, value_name: &str) -> String {
    if rename.is_empty() {
        return value_name.to_string();
    }
    prefix_negative_modifiers(rename, value_name)
}
