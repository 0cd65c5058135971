//! Macro for implementing Display and FromStr for string-backed enums
//!
//! Used by enums that travel as plain strings on the wire or in log fields
//! (themes, field names). Parsing is case-insensitive and ignores surrounding
//! whitespace; output is always the canonical lowercase form.
//!
//! # Example
//!
//! ```rust
//! use profilesync_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Accent {
//!     Warm,
//!     Cool,
//! }
//!
//! impl_domain_enum_conversions!(Accent {
//!     Warm => "warm",
//!     Cool => "cool",
//! });
//!
//! assert_eq!(Accent::Cool.to_string(), "cool");
//! assert_eq!(" WARM ".parse::<Accent>(), Ok(Accent::Warm));
//! ```

/// Implements Display, FromStr and `as_str` for a fieldless enum.
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their canonical
///   lowercase representations
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
