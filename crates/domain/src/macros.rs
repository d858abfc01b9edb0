//! Display / FromStr generation for wire-named status enums
//!
//! Booking statuses arrive from other subsystems as strings in whatever case
//! and separator the caller used (`"IN_NEGOTIATION"`, `"in-negotiation"`,
//! `"In Negotiation"`). The macro normalises case and separators before
//! matching and always prints the canonical snake_case name.
//!
//! # Example
//!
//! ```rust
//! use stagesync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Stage {
//!     SoundCheck,
//!     OnStage,
//! }
//!
//! impl_domain_status_conversions!(Stage {
//!     SoundCheck => "sound_check",
//!     OnStage => "on_stage",
//! });
//!
//! assert_eq!("Sound-Check".parse::<Stage>().unwrap(), Stage::SoundCheck);
//! assert_eq!(Stage::OnStage.to_string(), "on_stage");
//! ```

/// Implements Display and FromStr for a status enum.
///
/// Parsing lowercases the input and maps `-` and spaces to `_`; unknown values
/// produce an error string naming the enum.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized: String = s
                    .trim()
                    .chars()
                    .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_lowercase() })
                    .collect();
                match normalized.as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Draft,
        InReview,
        Closed,
    }

    impl_domain_status_conversions!(Phase {
        Draft => "draft",
        InReview => "in_review",
        Closed => "closed",
    });

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(Phase::Draft.to_string(), "draft");
        assert_eq!(Phase::InReview.to_string(), "in_review");
    }

    #[test]
    fn test_fromstr_accepts_case_and_separator_variants() {
        assert_eq!(Phase::from_str("IN_REVIEW").unwrap(), Phase::InReview);
        assert_eq!(Phase::from_str("in-review").unwrap(), Phase::InReview);
        assert_eq!(Phase::from_str(" In Review ").unwrap(), Phase::InReview);
        assert_eq!(Phase::from_str("Closed").unwrap(), Phase::Closed);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = Phase::from_str("archived");
        assert!(result.unwrap_err().contains("Invalid Phase: archived"));
        assert!(Phase::from_str("").is_err());
    }
}
