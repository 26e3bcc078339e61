//! Validated titles for lists, budgets and categories.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A non-empty title with a maximum length in characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Title(String);

impl Title {
    /// Create a title, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::EmptyTitle] if `title` is empty or only whitespace,
    /// - or [Error::TitleTooLong] if `title` has more than `max_length` characters.
    pub fn new(title: &str, max_length: usize) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            Err(Error::EmptyTitle)
        } else if title.chars().count() > max_length {
            Err(Error::TitleTooLong(max_length))
        } else {
            Ok(Self(title.to_owned()))
        }
    }

    /// Create a title without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(title: &str) -> Self {
        Self(title.to_owned())
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
