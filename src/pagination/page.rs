//! Page node attributes and their markup mapping

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Class carried by every page element
pub const PAGE_CLASS: &str = "page-node";

/// Numeric page-number attribute
pub const ATTR_PAGE_NUMBER: &str = "pagenumber";

/// Overflow marker, present only when the page overflows
pub const ATTR_OVERFLOW: &str = "data-overflow";

/// Cosmetic overflow state of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Normal,
    Overflowing,
}

/// Attributes of a page node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttrs {
    /// Page number, starting at 1
    pub ordinal: u32,
    /// Set only by continuous overflow detection
    pub is_overflowing: bool,
}

impl Default for PageAttrs {
    fn default() -> Self {
        Self {
            ordinal: 1,
            is_overflowing: false,
        }
    }
}

impl PageAttrs {
    /// Attributes for page number `ordinal`
    pub fn numbered(ordinal: u32) -> Self {
        Self {
            ordinal,
            ..Self::default()
        }
    }

    pub fn state(&self) -> PageState {
        if self.is_overflowing {
            PageState::Overflowing
        } else {
            PageState::Normal
        }
    }

    /// Copy with the overflow flag replaced
    pub fn with_overflowing(&self, is_overflowing: bool) -> Self {
        Self {
            is_overflowing,
            ..self.clone()
        }
    }

    /// Copy with the ordinal replaced
    pub fn with_ordinal(&self, ordinal: u32) -> Self {
        Self {
            ordinal,
            ..self.clone()
        }
    }

    /// Markup attributes for this page (besides the class)
    pub fn to_markup_attrs(&self) -> SmallVec<[(&'static str, String); 2]> {
        let mut attrs = SmallVec::new();
        attrs.push((ATTR_PAGE_NUMBER, self.ordinal.to_string()));
        if self.is_overflowing {
            attrs.push((ATTR_OVERFLOW, "true".to_string()));
        }
        attrs
    }

    /// Read page attributes back from markup attributes.
    ///
    /// A missing or non-numeric page number falls back to 1; the overflow
    /// flag is set only by an exact `"true"` marker.
    pub fn from_markup_attrs<'a, I>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut parsed = Self::default();
        for (name, value) in attrs {
            if name.eq_ignore_ascii_case(ATTR_PAGE_NUMBER) {
                parsed.ordinal = value.trim().parse().unwrap_or(1);
            } else if name.eq_ignore_ascii_case(ATTR_OVERFLOW) {
                parsed.is_overflowing = value == "true";
            }
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let attrs = PageAttrs::default();
        assert_eq!(attrs.ordinal, 1);
        assert_eq!(attrs.state(), PageState::Normal);
    }

    #[test]
    fn test_overflow_marker_only_when_true() {
        let attrs = PageAttrs::numbered(3);
        assert_eq!(
            attrs.to_markup_attrs().as_slice(),
            &[(ATTR_PAGE_NUMBER, "3".to_string())]
        );

        let overflowing = attrs.with_overflowing(true);
        assert_eq!(overflowing.state(), PageState::Overflowing);
        assert_eq!(
            overflowing.to_markup_attrs().as_slice(),
            &[
                (ATTR_PAGE_NUMBER, "3".to_string()),
                (ATTR_OVERFLOW, "true".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_markup_attrs() {
        let attrs = PageAttrs::from_markup_attrs([("pagenumber", "7"), ("data-overflow", "true")]);
        assert_eq!(attrs.ordinal, 7);
        assert!(attrs.is_overflowing);

        let attrs = PageAttrs::from_markup_attrs([("pagenumber", "x"), ("data-overflow", "false")]);
        assert_eq!(attrs, PageAttrs::default());
    }

    #[test]
    fn test_deserialize_with_camel_case() {
        let attrs: PageAttrs =
            serde_json::from_str(r#"{"ordinal":2,"isOverflowing":true}"#).unwrap();
        assert_eq!(attrs.with_ordinal(4).ordinal, 4);
        assert!(attrs.is_overflowing);
    }
}
