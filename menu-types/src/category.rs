//! The fixed menu categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named grouping of menu items.
///
/// The order of [`Category::ALL`] is the display order on every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Hot dog combo plates
    Completos,
    Empanadas,
    Sandwich,
    /// Drinks
    Bebestibles,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Completos,
        Category::Empanadas,
        Category::Sandwich,
        Category::Bebestibles,
    ];

    /// Key used in the backend tree and inside the bundled JSON wrapper.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Completos => "completos",
            Category::Empanadas => "empanadas",
            Category::Sandwich => "sandwich",
            Category::Bebestibles => "bebestibles",
        }
    }

    /// File name of the bundled JSON for this category.
    pub fn file_name(&self) -> &'static str {
        match self {
            Category::Completos => "completos.json",
            Category::Empanadas => "empanadas.json",
            Category::Sandwich => "sandwich.json",
            Category::Bebestibles => "bebestibles.json",
        }
    }

    /// Heading shown on the menu pages.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Completos => "Completos",
            Category::Empanadas => "Empanadas",
            Category::Sandwich => "Sándwich",
            Category::Bebestibles => "Bebestibles",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name one of the fixed categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown menu category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!("completos".parse::<Category>(), Ok(Category::Completos));
        assert_eq!("bebestibles".parse::<Category>(), Ok(Category::Bebestibles));
        assert!("Completos".parse::<Category>().is_err());
        assert!("_settings".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(
            serde_json::to_string(&Category::Sandwich).unwrap(),
            "\"sandwich\""
        );
        assert_eq!(Category::Empanadas.file_name(), "empanadas.json");
    }
}
