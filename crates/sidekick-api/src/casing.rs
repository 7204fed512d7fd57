//! Identifier casing shared by the parsers and the codecs.
//!
//! All conversions split the input into words first, so `GetOAuthUrl`,
//! `get_o_auth_url` and `GET_O_AUTH_URL` land on the same word list.

/// Split an identifier into words.
///
/// Boundaries are `_`, `-`, `.`, spaces, a lowercase or digit followed by an
/// uppercase letter (`listUsers` → `list|Users`), and the last uppercase
/// letter of an acronym followed by a lowercase one (`HTTPServer` → `HTTP|Server`).
/// Digits stay attached to the preceding word (`Int64Value` → `Int64|Value`).
#[must_use]
pub fn words(s: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | '.' | ' ') {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_is_lower_or_digit = prev.is_lowercase() || prev.is_ascii_digit();
            if prev_is_lower_or_digit || (prev.is_uppercase() && next_is_lower) {
                result.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `GetOAuthUrl` → `get_o_auth_url`.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `list_users` → `ListUsers`.
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    words(s).iter().map(|w| capitalize(w)).collect()
}

/// `page_token` → `pageToken`.
#[must_use]
pub fn to_lower_camel_case(s: &str) -> String {
    let words = words(s);
    let mut result = String::with_capacity(s.len());
    for (i, w) in words.iter().enumerate() {
        if i == 0 {
            result.push_str(&w.to_lowercase());
        } else {
            result.push_str(&capitalize(w));
        }
    }
    result
}

/// `enumValue` → `ENUM_VALUE`.
#[must_use]
pub fn to_screaming_snake_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}
