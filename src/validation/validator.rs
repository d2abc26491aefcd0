use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// RFC-approximate email pattern: a local part, `@`, and dot-separated labels.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex should compile")
});

/// Accumulates validation failures for a single form submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    field_errors: HashMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// True when no field or non-field errors have been recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Records `message` under `field` when `ok` is false.
    ///
    /// Only the first failing check per field is kept.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.field_errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
    }

    /// Records `message` under `field`, replacing any earlier message.
    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .insert(field.to_string(), message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// True if `value` contains anything other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if `value` has at least `n` characters.
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True if `value` has at most `n` characters.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True if `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: T, permitted: &[T]) -> bool {
    permitted.contains(&value)
}

pub fn valid_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL_REGEX.is_match(value)
}
