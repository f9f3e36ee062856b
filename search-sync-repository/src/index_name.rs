//! Index naming rules.
//!
//! Index names follow the search engine's grammar: lowercase, at most 255
//! bytes, no path or wildcard characters, no leading `-`, `_` or `+`, and
//! never `.` or `..`. Names built from user input (site handles, type names)
//! must go through [`IndexNameValidator::sanitize`] before use.

use std::fmt;

use crate::errors::IndexNameError;

/// Maximum length of an index name in bytes.
pub const MAX_INDEX_NAME_BYTES: usize = 255;

/// Length sanitized names are cut down to when they exceed the maximum,
/// leaving room for suffixes such as version markers.
pub const TRUNCATED_INDEX_NAME_BYTES: usize = 200;

/// Name used when nothing usable survives sanitization.
pub const FALLBACK_INDEX_NAME: &str = "index";

const FORBIDDEN_CHARACTERS: [char; 12] =
    ['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

const FORBIDDEN_LEADING: [char; 3] = ['-', '_', '+'];

/// A single rule an index name breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexNameViolation {
    Empty,
    ContainsNul,
    TooLong { bytes: usize },
    Reserved,
    NotLowercase,
    InvalidLeadingCharacter(char),
    ForbiddenCharacters(Vec<char>),
}

impl fmt::Display for IndexNameViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "must not be empty"),
            Self::ContainsNul => write!(f, "must not contain NUL bytes"),
            Self::TooLong { bytes } => write!(
                f,
                "is {} bytes long, maximum is {}",
                bytes, MAX_INDEX_NAME_BYTES
            ),
            Self::Reserved => write!(f, "must not be '.' or '..'"),
            Self::NotLowercase => write!(f, "must be lowercase"),
            Self::InvalidLeadingCharacter(c) => write!(f, "must not start with '{}'", c),
            Self::ForbiddenCharacters(chars) => {
                let listed = chars
                    .iter()
                    .map(|c| format!("'{}'", c))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "contains forbidden characters {}", listed)
            }
        }
    }
}

/// Validation and repair of index names.
pub struct IndexNameValidator;

impl IndexNameValidator {
    /// Check a name against every naming rule.
    ///
    /// All violations are reported; only an empty name stops the check early.
    pub fn validate(name: &str) -> Vec<IndexNameViolation> {
        if name.is_empty() {
            return vec![IndexNameViolation::Empty];
        }

        let mut violations = Vec::new();

        if name.contains('\0') {
            violations.push(IndexNameViolation::ContainsNul);
        }
        if name.len() > MAX_INDEX_NAME_BYTES {
            violations.push(IndexNameViolation::TooLong { bytes: name.len() });
        }
        if name == "." || name == ".." {
            violations.push(IndexNameViolation::Reserved);
        }
        if name.to_lowercase() != name {
            violations.push(IndexNameViolation::NotLowercase);
        }
        if let Some(first) = name.chars().next().filter(|c| FORBIDDEN_LEADING.contains(c)) {
            violations.push(IndexNameViolation::InvalidLeadingCharacter(first));
        }

        let mut forbidden: Vec<char> = Vec::new();
        for c in name.chars().filter(|c| FORBIDDEN_CHARACTERS.contains(c)) {
            if !forbidden.contains(&c) {
                forbidden.push(c);
            }
        }
        if !forbidden.is_empty() {
            violations.push(IndexNameViolation::ForbiddenCharacters(forbidden));
        }

        violations
    }

    pub fn is_valid(name: &str) -> bool {
        Self::validate(name).is_empty()
    }

    /// Reject a name instead of repairing it.
    pub fn ensure_valid(name: &str) -> Result<(), IndexNameError> {
        let violations = Self::validate(name);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(IndexNameError {
                name: name.to_string(),
                violations,
            })
        }
    }

    /// Turn any string into a valid index name.
    ///
    /// Valid names come back unchanged, and the result is always valid, so
    /// `sanitize(sanitize(x)) == sanitize(x)`.
    pub fn sanitize(name: &str) -> String {
        let replaced: String = name
            .to_lowercase()
            .chars()
            .filter(|c| *c != '\0')
            .map(|c| if FORBIDDEN_CHARACTERS.contains(&c) { '-' } else { c })
            .collect();

        let trimmed = replaced.trim_start_matches(FORBIDDEN_LEADING);
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            return FALLBACK_INDEX_NAME.to_string();
        }

        // Only over-long names are cut, otherwise valid names would change.
        let candidate = if trimmed.len() > MAX_INDEX_NAME_BYTES {
            truncate_at_char_boundary(trimmed, TRUNCATED_INDEX_NAME_BYTES)
        } else {
            trimmed
        };

        if Self::is_valid(candidate) {
            candidate.to_string()
        } else {
            FALLBACK_INDEX_NAME.to_string()
        }
    }
}

/// Build the index name for a site/type pair: `{prefix}_{site}_{type}`, sanitized.
pub fn compose_index_name(prefix: &str, site_id: u64, type_name: &str) -> String {
    IndexNameValidator::sanitize(&format!("{}_{}_{}", prefix, site_id, type_name))
}

fn truncate_at_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["products", "site_1_entry", "my-index-", ".hidden", "a+b", "日本語"] {
            assert!(IndexNameValidator::is_valid(name), "{} should be valid", name);
            assert_eq!(IndexNameValidator::sanitize(name), name);
        }
    }

    #[test]
    fn test_empty_name_short_circuits() {
        assert_eq!(
            IndexNameValidator::validate(""),
            vec![IndexNameViolation::Empty]
        );
    }

    #[test]
    fn test_accumulates_violations() {
        let violations = IndexNameValidator::validate("_My Index?");
        assert!(violations.contains(&IndexNameViolation::NotLowercase));
        assert!(violations.contains(&IndexNameViolation::InvalidLeadingCharacter('_')));
        assert!(violations.contains(&IndexNameViolation::ForbiddenCharacters(vec![' ', '?'])));
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn test_reserved_and_length() {
        assert_eq!(
            IndexNameValidator::validate(".."),
            vec![IndexNameViolation::Reserved]
        );
        let long = "a".repeat(256);
        assert_eq!(
            IndexNameValidator::validate(&long),
            vec![IndexNameViolation::TooLong { bytes: 256 }]
        );
        assert!(IndexNameValidator::is_valid(&"a".repeat(255)));
    }

    #[test]
    fn test_nul_byte() {
        assert!(IndexNameValidator::validate("ab\0c").contains(&IndexNameViolation::ContainsNul));
        assert_eq!(IndexNameValidator::sanitize("ab\0c"), "abc");
    }

    #[test]
    fn test_sanitize_scenarios() {
        let sanitized = IndexNameValidator::sanitize("My Index!");
        assert_eq!(sanitized, "my-index!");
        assert!(IndexNameValidator::is_valid(&sanitized));

        assert_eq!(IndexNameValidator::sanitize(".."), FALLBACK_INDEX_NAME);
        assert_eq!(IndexNameValidator::sanitize("."), FALLBACK_INDEX_NAME);
        assert_eq!(IndexNameValidator::sanitize(""), FALLBACK_INDEX_NAME);
        assert_eq!(IndexNameValidator::sanitize("\0"), FALLBACK_INDEX_NAME);
        assert_eq!(IndexNameValidator::sanitize("--_+"), FALLBACK_INDEX_NAME);
        assert_eq!(IndexNameValidator::sanitize("_-Products"), "products");
        assert_eq!(IndexNameValidator::sanitize("a/b\\c*d"), "a-b-c-d");
    }

    #[test]
    fn test_sanitize_leading_forbidden_becomes_stripped() {
        // ' ' turns into '-' first, then the leading run is stripped.
        assert_eq!(IndexNameValidator::sanitize("  news"), "news");
        assert_eq!(IndexNameValidator::sanitize(":.."), FALLBACK_INDEX_NAME);
    }

    #[test]
    fn test_sanitize_truncates_long_names_on_char_boundary() {
        let long = "é".repeat(200);
        let sanitized = IndexNameValidator::sanitize(&long);
        assert!(sanitized.len() <= TRUNCATED_INDEX_NAME_BYTES);
        assert!(IndexNameValidator::is_valid(&sanitized));

        let ascii = "b".repeat(300);
        assert_eq!(IndexNameValidator::sanitize(&ascii).len(), TRUNCATED_INDEX_NAME_BYTES);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "",
            "\0",
            "My Index!",
            "..",
            "_leading",
            "UPPER/lower",
            "a,b#c:d",
            "ΑΣ",
            "\0-\0_x",
        ];
        let long = "Ü".repeat(180);
        for input in inputs.iter().copied().chain(std::iter::once(long.as_str())) {
            let once = IndexNameValidator::sanitize(input);
            assert!(IndexNameValidator::is_valid(&once), "{:?} -> {:?}", input, once);
            assert_eq!(IndexNameValidator::sanitize(&once), once);
        }
    }

    #[test]
    fn test_ensure_valid() {
        assert!(IndexNameValidator::ensure_valid("entries").is_ok());
        let err = IndexNameValidator::ensure_valid("Entries").unwrap_err();
        assert_eq!(err.violations, vec![IndexNameViolation::NotLowercase]);
        assert!(err.to_string().contains("must be lowercase"));
    }

    #[test]
    fn test_compose_index_name() {
        assert_eq!(compose_index_name("craft", 1, "entry"), "craft_1_entry");
        assert_eq!(compose_index_name("My Site", 2, "digital-product"), "my-site_2_digital-product");
        assert_eq!(compose_index_name("", 3, "asset"), "3_asset");
    }
}
