use std::fmt;
use serde::{Deserialize, Serialize};

use super::error::CategorizerError;

/// An expense category label.
///
/// Categories come from the training data, so the set is open: any
/// non-blank string is accepted and kept verbatim, whitespace and casing
/// included.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Creates a category, rejecting blank labels
    ///
    /// # Example
    /// ```
    /// use expense_categorizer::Category;
    ///
    /// let category = Category::new("Food ").unwrap();
    /// assert_eq!(category.as_str(), "Food ");
    /// assert!(Category::new("   ").is_err());
    /// ```
    pub fn new(label: impl Into<String>) -> Result<Self, CategorizerError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(CategorizerError::DataFormat("Category label cannot be empty".into()));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Category {
    type Error = CategorizerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Category {
    type Error = CategorizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl PartialEq<str> for Category {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_keeps_casing() {
        let category = Category::new("Food & Drink").unwrap();
        assert_eq!(category, "Food & Drink");
        assert_eq!(category.to_string(), "Food & Drink");
    }

    #[test]
    fn test_surrounding_whitespace_kept() {
        let padded = Category::new("Food ").unwrap();
        assert_eq!(padded, "Food ");
        assert_ne!(padded, Category::new("Food").unwrap());
    }

    #[test]
    fn test_blank_category_rejected() {
        assert!(matches!(Category::new(""), Err(CategorizerError::DataFormat(_))));
        assert!(matches!(Category::new(" \t"), Err(CategorizerError::DataFormat(_))));
    }

    #[test]
    fn test_category_ordering_is_lexicographic() {
        let mut labels = vec![Category::new("Transport").unwrap(), Category::new("Food").unwrap()];
        labels.sort();
        assert_eq!(labels[0], "Food");
    }
}
