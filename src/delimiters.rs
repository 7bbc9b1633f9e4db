//! Delimiter sets and character classification.
//!
//! Every interchange negotiates (or inherits) one [`Delimiters`] value. It is
//! fixed once the interchange header has been read and governs how the
//! tokenizer classifies each character it reads.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::{CharClass, Delimiters};
//!
//! let delimiters = Delimiters::new('*', '~').with_sub_element(':');
//! assert_eq!(delimiters.classify('*'), CharClass::Delimiter);
//! assert_eq!(delimiters.classify(':'), CharClass::SubDelimiter);
//! assert_eq!(delimiters.classify('A'), CharClass::Data);
//! ```

use serde::Serialize;

/// The role a character plays under the active delimiter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CharClass {
    Data,
    Delimiter,
    SubDelimiter,
    SubSubDelimiter,
    Terminator,
    Release,
    Repetition,
    Eof,
}

/// The delimiter characters of one interchange.
///
/// `field` and `terminator` are always present. The others are optional
/// because not every dialect (or every interchange) uses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delimiters {
    pub field: char,
    pub terminator: char,
    /// Characters that conventionally follow the terminator (e.g. `"\r\n"`).
    pub terminator_suffix: Option<String>,
    pub sub_element: Option<char>,
    pub sub_sub_element: Option<char>,
    pub release: Option<char>,
    pub repetition: Option<char>,
    /// Separates the segment tag from its first element (TRADACOMS `=`).
    pub tag: Option<char>,
    pub decimal_mark: Option<char>,
}

impl Delimiters {
    /// Creates a delimiter set with only a field delimiter and terminator.
    #[must_use]
    pub fn new(field: char, terminator: char) -> Self {
        Delimiters {
            field,
            terminator,
            terminator_suffix: None,
            sub_element: None,
            sub_sub_element: None,
            release: None,
            repetition: None,
            tag: None,
            decimal_mark: None,
        }
    }

    /// The EDIFACT service characters used when no `UNA` segment is present.
    #[must_use]
    pub fn edifact() -> Self {
        Delimiters::new('+', '\'')
            .with_sub_element(':')
            .with_release('?')
            .with_decimal_mark('.')
    }

    /// The fixed TRADACOMS delimiters.
    #[must_use]
    pub fn tradacoms() -> Self {
        Delimiters::new('+', '\'')
            .with_sub_element(':')
            .with_release('?')
            .with_tag('=')
    }

    #[must_use]
    pub fn with_sub_element(mut self, c: char) -> Self {
        self.sub_element = Some(c);
        self
    }

    #[must_use]
    pub fn with_sub_sub_element(mut self, c: char) -> Self {
        self.sub_sub_element = Some(c);
        self
    }

    #[must_use]
    pub fn with_release(mut self, c: char) -> Self {
        self.release = Some(c);
        self
    }

    #[must_use]
    pub fn with_repetition(mut self, c: char) -> Self {
        self.repetition = Some(c);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, c: char) -> Self {
        self.tag = Some(c);
        self
    }

    #[must_use]
    pub fn with_decimal_mark(mut self, c: char) -> Self {
        self.decimal_mark = Some(c);
        self
    }

    #[must_use]
    pub fn with_terminator_suffix(mut self, suffix: &str) -> Self {
        self.terminator_suffix = if suffix.is_empty() {
            None
        } else {
            Some(suffix.to_string())
        };
        self
    }

    /// Classifies a character against this delimiter set.
    ///
    /// The terminator wins over every other role, then the field delimiter,
    /// so a misconfigured set that reuses a character still tokenizes
    /// deterministically.
    #[must_use]
    pub fn classify(&self, c: char) -> CharClass {
        if c == self.terminator {
            CharClass::Terminator
        } else if c == self.field {
            CharClass::Delimiter
        } else if Some(c) == self.sub_element {
            CharClass::SubDelimiter
        } else if Some(c) == self.sub_sub_element {
            CharClass::SubSubDelimiter
        } else if Some(c) == self.release {
            CharClass::Release
        } else if Some(c) == self.repetition {
            CharClass::Repetition
        } else {
            CharClass::Data
        }
    }

    /// Returns `true` if `c` has any delimiter role.
    #[must_use]
    pub fn is_delimiter(&self, c: char) -> bool {
        self.classify(c) != CharClass::Data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_full_set() {
        let d = Delimiters::edifact()
            .with_repetition('*')
            .with_sub_sub_element('&');
        assert_eq!(d.classify('+'), CharClass::Delimiter);
        assert_eq!(d.classify('\''), CharClass::Terminator);
        assert_eq!(d.classify(':'), CharClass::SubDelimiter);
        assert_eq!(d.classify('&'), CharClass::SubSubDelimiter);
        assert_eq!(d.classify('?'), CharClass::Release);
        assert_eq!(d.classify('*'), CharClass::Repetition);
        assert_eq!(d.classify('.'), CharClass::Data);
    }

    #[test]
    fn test_terminator_takes_precedence() {
        let d = Delimiters::new('~', '~');
        assert_eq!(d.classify('~'), CharClass::Terminator);
    }

    #[test]
    fn test_tag_is_not_classified() {
        let d = Delimiters::tradacoms();
        assert_eq!(d.classify('='), CharClass::Data);
        assert_eq!(d.tag, Some('='));
    }

    #[test]
    fn test_empty_suffix_is_none() {
        let d = Delimiters::new('*', '~').with_terminator_suffix("");
        assert_eq!(d.terminator_suffix, None);
        let d = d.with_terminator_suffix("\r\n");
        assert_eq!(d.terminator_suffix.as_deref(), Some("\r\n"));
    }
}
