//! Title identifier validation.
//!
//! A title id is nine characters: a four letter platform/region prefix and a
//! five digit serial, e.g. `BLUS30443`. The prefix is matched case
//! insensitively and stored uppercased.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::error::{UpdateError, UpdateResult};

/// Length of a title id in characters.
pub const TITLE_ID_LEN: usize = 9;

/// Prefixes accepted by default.
///
/// Disc (`B*`) and digital (`NP*`) releases across the regions the update
/// endpoint serves.
pub const DEFAULT_PREFIXES: [&str; 25] = [
    "BCAS", "BCES", "BCJS", "BCKS", "BCUS", //
    "BLAS", "BLES", "BLJM", "BLJS", "BLKS", "BLUS", //
    "NPEA", "NPEB", "NPEZ", //
    "NPHA", "NPHB", "NPHZ", //
    "NPJA", "NPJB", "NPJZ", //
    "NPUA", "NPUB", "NPUZ", //
    "NPKA", "NPKB",
];

fn title_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{4}[0-9]{5}$").unwrap())
}

/// A validated title identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleId(String);

impl TitleId {
    /// Validate `raw` against the title id shape and the given prefix allow-list.
    ///
    /// # Errors
    ///
    /// - `UpdateError::Format` if the input is not 9 characters, or is not
    ///   four letters followed by five digits.
    /// - `UpdateError::UnsupportedIdentifier` if the prefix is not allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use titlepatch::identifier::{TitleId, DEFAULT_PREFIXES};
    ///
    /// let id = TitleId::parse("blus30443", &DEFAULT_PREFIXES).unwrap();
    /// assert_eq!(id.as_str(), "BLUS30443");
    /// assert_eq!(id.prefix(), "BLUS");
    /// ```
    pub fn parse<S: AsRef<str>>(raw: &str, allowed_prefixes: &[S]) -> UpdateResult<Self> {
        let len = raw.chars().count();
        if len != TITLE_ID_LEN {
            return Err(UpdateError::Format {
                input: raw.to_string(),
                reason: format!("expected {} characters, got {}", TITLE_ID_LEN, len),
            });
        }

        // Only the prefix is case-normalized; the serial must already be digits.
        let normalized: String = raw
            .chars()
            .enumerate()
            .map(|(i, c)| if i < 4 { c.to_ascii_uppercase() } else { c })
            .collect();

        if !title_id_pattern().is_match(&normalized) {
            return Err(UpdateError::Format {
                input: raw.to_string(),
                reason: "expected four letters followed by five digits".to_string(),
            });
        }

        let prefix = &normalized[..4];
        if !allowed_prefixes
            .iter()
            .any(|p| p.as_ref().eq_ignore_ascii_case(prefix))
        {
            return Err(UpdateError::UnsupportedIdentifier {
                title_id: normalized.clone(),
                prefix: prefix.to_string(),
            });
        }

        info!(title_id = %normalized, "title id accepted");
        Ok(Self(normalized))
    }

    /// The full identifier, uppercased.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The four letter platform/region prefix.
    pub fn prefix(&self) -> &str {
        &self.0[..4]
    }

    /// The five digit serial.
    pub fn serial(&self) -> &str {
        &self.0[4..]
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TitleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> UpdateResult<TitleId> {
        TitleId::parse(raw, &DEFAULT_PREFIXES)
    }

    #[test]
    fn test_valid_id() {
        let id = parse("BLUS30443").unwrap();
        assert_eq!(id.as_str(), "BLUS30443");
        assert_eq!(id.prefix(), "BLUS");
        assert_eq!(id.serial(), "30443");
        assert_eq!(id.to_string(), "BLUS30443");
    }

    #[test]
    fn test_lowercase_prefix_is_normalized() {
        let id = parse("npeB01234").unwrap();
        assert_eq!(id.as_str(), "NPEB01234");
    }

    #[test]
    fn test_wrong_length_is_format_error() {
        assert!(matches!(parse(""), Err(UpdateError::Format { .. })));
        assert!(matches!(parse("BLUS3044"), Err(UpdateError::Format { .. })));
        assert!(matches!(parse("BLUS304430"), Err(UpdateError::Format { .. })));
    }

    #[test]
    fn test_bad_shape_is_format_error() {
        assert!(matches!(parse("BLU530443"), Err(UpdateError::Format { .. })));
        assert!(matches!(parse("BLUS3044A"), Err(UpdateError::Format { .. })));
        assert!(matches!(parse("BLUS-0443"), Err(UpdateError::Format { .. })));
    }

    #[test]
    fn test_multibyte_input_counts_characters() {
        // Nine characters, more than nine bytes.
        assert!(matches!(parse("ÉLUS30443"), Err(UpdateError::Format { .. })));
        assert!(matches!(parse("ÉLUS3044"), Err(UpdateError::Format { .. })));
    }

    #[test]
    fn test_unknown_prefix_is_unsupported() {
        match parse("ABCD12345") {
            Err(UpdateError::UnsupportedIdentifier { title_id, prefix }) => {
                assert_eq!(title_id, "ABCD12345");
                assert_eq!(prefix, "ABCD");
            }
            other => panic!("expected UnsupportedIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_allow_list() {
        let allowed = vec!["TEST".to_string()];
        assert!(TitleId::parse("test00001", &allowed).is_ok());
        assert!(matches!(
            TitleId::parse("BLUS30443", &allowed),
            Err(UpdateError::UnsupportedIdentifier { .. })
        ));
    }

    #[test]
    fn test_default_prefixes_are_unique_and_well_formed() {
        let mut seen = std::collections::HashSet::new();
        for prefix in DEFAULT_PREFIXES {
            assert_eq!(prefix.len(), 4);
            assert!(prefix.chars().all(|c| c.is_ascii_uppercase()));
            assert!(seen.insert(prefix), "duplicate prefix {}", prefix);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_any_length_other_than_nine_is_format_error(raw in "\\PC{0,20}") {
                prop_assume!(raw.chars().count() != TITLE_ID_LEN);
                let is_format_error = matches!(parse(&raw), Err(UpdateError::Format { .. }));
                prop_assert!(is_format_error);
            }

            #[test]
            fn test_unknown_prefix_with_valid_shape_is_unsupported(
                prefix in "[A-Z]{4}",
                serial in "[0-9]{5}"
            ) {
                prop_assume!(!DEFAULT_PREFIXES.contains(&prefix.as_str()));
                let raw = format!("{}{}", prefix, serial);
                let is_unsupported =
                    matches!(parse(&raw), Err(UpdateError::UnsupportedIdentifier { .. }));
                prop_assert!(is_unsupported);
            }

            #[test]
            fn test_known_prefix_in_any_case_is_accepted(
                index in 0usize..DEFAULT_PREFIXES.len(),
                lower_mask in prop::array::uniform4(any::<bool>()),
                serial in "[0-9]{5}"
            ) {
                let prefix: String = DEFAULT_PREFIXES[index]
                    .chars()
                    .zip(lower_mask)
                    .map(|(c, lower)| if lower { c.to_ascii_lowercase() } else { c })
                    .collect();
                let raw = format!("{}{}", prefix, serial);
                let id = parse(&raw)?;
                prop_assert_eq!(id.prefix(), DEFAULT_PREFIXES[index]);
                prop_assert_eq!(id.serial(), serial.as_str());
            }
        }
    }
}
