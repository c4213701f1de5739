//! Foreign-key naming convention: a field named `<token>_id` refers to the
//! table named `capitalize(<token>)` (`user_id` -> `User`).

pub const FOREIGN_KEY_SUFFIX: &str = "_id";

/// Uppercases the first character and keeps the rest as is.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Table name a field name points at, if the name follows the convention.
///
/// The token before `_id` must be non-empty and contain no uppercase
/// characters.
pub fn referenced_table_name(field_name: &str) -> Option<String> {
    let token = field_name.strip_suffix(FOREIGN_KEY_SUFFIX)?;
    if token.is_empty() || token.chars().any(char::is_uppercase) {
        return None;
    }
    Some(capitalize(token))
}

pub fn references(field_name: &str, table_name: &str) -> bool {
    referenced_table_name(field_name).is_some_and(|target| target == table_name)
}
