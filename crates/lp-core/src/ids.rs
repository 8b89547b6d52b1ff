//! Typed ID wrappers providing compile-time safety for corpus identifiers.
//!
//! Course IDs come verbatim from the corpus listing; lesson IDs are derived
//! from a course ID and a 0-based track position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generate a newtype ID wrapper over `String`.
///
/// The macro produces a struct with:
/// - `new()` taking anything convertible into a `String`
/// - `as_str()` borrowing the inner value
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`, `Serialize`, `Deserialize`
/// - `Display` and `From<&str>` / `From<String>` conversions
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Wrap an identifier.
                #[must_use]
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                /// Borrow the identifier as a string slice.
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }
        )+
    };
}

typed_id! {
    /// Identifier of a course, as listed in the corpus `list.txt`.
    CourseId,
    /// Identifier of a lesson: course ID followed by its 1-based number.
    LessonId,
}

impl LessonId {
    /// Derive the lesson identifier for a 0-based track position.
    ///
    /// `LessonId::for_position(&"spanish".into(), 0)` is `spanish1`.
    pub fn for_position(course: &CourseId, position: usize) -> Self {
        Self(format!("{}{}", course, position + 1))
    }
}
