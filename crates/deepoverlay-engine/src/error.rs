//! Error types for the engine crate.

use thiserror::Error;

/// Failure to parse a locator string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorParseError {
    #[error("Empty locator")]
    Empty,

    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { offset: usize, ch: char },

    #[error("Locator ended unexpectedly")]
    UnexpectedEnd,

    #[error("Invalid nth-of-type index: {0}")]
    InvalidIndex(String),

    /// Paths must start at `html` or at an `#id` segment.
    #[error("Unsupported first segment: {0}")]
    UnsupportedStart(String),

    /// An `#id` segment appeared after the first position.
    #[error("Id segment '{0}' is only allowed at the start")]
    MisplacedId(String),
}

/// Reason a drawn box could not be bound to an element. The box stays
/// floating at its absolute position.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unanchored {
    /// Nothing under the box center (outside the viewport).
    #[error("No element under the box")]
    NoElement,

    /// Only the document root or body is under the box center.
    #[error("Box lies over the document root")]
    DocumentRoot,

    /// The element under the box has no re-queryable path.
    #[error("Element under the box has no locator")]
    NoLocator,

    /// The element has zero, negative or non-finite size.
    #[error("Anchor element is degenerate")]
    DegenerateAnchor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LocatorParseError::UnexpectedChar { offset: 3, ch: '?' }.to_string(),
            "Unexpected character '?' at offset 3"
        );
        assert_eq!(Unanchored::DocumentRoot.to_string(), "Box lies over the document root");
    }
}
