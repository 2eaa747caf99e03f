//! Form validation for categories and items.
//!
//! Checks are pure and accumulate: every rule runs and every failure is
//! recorded, so a re-rendered form can show all problems at once. Checks that
//! need the store (category name uniqueness, category existence) live in the
//! services and append to the same [`ValidationErrors`].

use std::fmt;

use stockroom_core::CategoryId;

use crate::model::{DEFAULT_CATEGORY_DESCRIPTION, DEFAULT_ITEM_DESCRIPTION};

/// Category name length bounds, in characters.
pub const CATEGORY_NAME_LEN: (usize, usize) = (3, 20);
/// Maximum category description length, in characters.
pub const CATEGORY_DESCRIPTION_MAX: usize = 120;
/// Item name length bounds, in characters.
pub const ITEM_NAME_LEN: (usize, usize) = (3, 40);
/// Maximum item description length, in characters.
pub const ITEM_DESCRIPTION_MAX: usize = 50;
/// Inclusive item price range, in dollars.
pub const PRICE_RANGE: (f64, f64) = (0.99, 999.99);
/// Maximum units in stock.
pub const QUANTITY_MAX: i64 = 99;

/// A single failed rule, keyed by the form field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name (`name`, `description`, `price`, ...).
    pub field: &'static str,
    /// User-facing message.
    pub message: String,
}

/// Accumulated validation failures for one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty error list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over failures in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns true if any failure is recorded against `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Returns the messages in order.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw category form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    /// Submitted name.
    pub name: String,
    /// Submitted description.
    pub description: String,
}

/// Category fields after trimming and defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    /// Trimmed name.
    pub name: String,
    /// Trimmed description, or the default when blank.
    pub description: String,
}

impl CategoryForm {
    /// Runs the field rules, recording failures into `errors`.
    ///
    /// Always returns the normalized draft so the caller can continue with
    /// store-backed checks.
    pub fn check(&self, errors: &mut ValidationErrors) -> CategoryDraft {
        let name = self.name.trim();
        let (min, max) = CATEGORY_NAME_LEN;
        if !within_chars(name, min, max) {
            errors.push("name", "Category name must be between 3 and 20 characters");
        }

        let description = self.description.trim();
        if description.chars().count() > CATEGORY_DESCRIPTION_MAX {
            errors.push(
                "description",
                "Category description cannot be more than 120 characters",
            );
        }

        CategoryDraft {
            name: name.to_string(),
            description: or_default(description, DEFAULT_CATEGORY_DESCRIPTION),
        }
    }
}

/// Raw item form submission.
///
/// `categories` holds every submitted value for the category field; zero or
/// several values are possible and are rejected during checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemForm {
    /// Submitted name.
    pub name: String,
    /// Submitted description.
    pub description: String,
    /// Submitted price text.
    pub price: String,
    /// Submitted stock text.
    pub quantity_in_stock: String,
    /// Submitted category ids.
    pub categories: Vec<String>,
}

/// Item fields after parsing, excluding the category link.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    /// Trimmed name.
    pub name: String,
    /// Trimmed description, or the default when blank.
    pub description: String,
    /// Parsed price.
    pub price: f64,
    /// Parsed stock count.
    pub quantity_in_stock: u8,
}

impl ItemForm {
    /// Runs the name, description, price and stock rules.
    ///
    /// Returns the parsed fields only when all of them passed.
    pub fn check_fields(&self, errors: &mut ValidationErrors) -> Option<ItemFields> {
        let before = errors.len();

        let name = self.name.trim();
        let (min, max) = ITEM_NAME_LEN;
        if !within_chars(name, min, max) {
            errors.push("name", "Item names must be between 3 & 40 characters long");
        }

        let description = self.description.trim();
        if description.chars().count() > ITEM_DESCRIPTION_MAX {
            errors.push("description", "Description cannot be more than 50 characters");
        }

        let price = parse_price(&self.price, errors);
        let quantity_in_stock = parse_quantity(&self.quantity_in_stock, errors);

        if errors.len() != before {
            return None;
        }

        Some(ItemFields {
            name: name.to_string(),
            description: or_default(description, DEFAULT_ITEM_DESCRIPTION),
            price: price?,
            quantity_in_stock: quantity_in_stock?,
        })
    }

    /// Parses the category reference list.
    ///
    /// Exactly one well-formed id is accepted. Whether it exists is checked
    /// by the item service.
    pub fn check_category(&self, errors: &mut ValidationErrors) -> Option<CategoryId> {
        let submitted: Vec<&str> = self
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();

        match submitted.as_slice() {
            [] => {
                errors.push("category", "Please select a category");
                None
            }
            [single] => match single.parse::<CategoryId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("category", "Selected category is not valid");
                    None
                }
            },
            _ => {
                errors.push("category", "An item must belong to exactly one category");
                None
            }
        }
    }
}

fn parse_price(raw: &str, errors: &mut ValidationErrors) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push("price", "Please enter item price");
        return None;
    }

    let (min, max) = PRICE_RANGE;
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && (min..=max).contains(&price) => Some(price),
        _ => {
            errors.push("price", "Price must fall within the range of $0.99 to $999.99");
            None
        }
    }
}

fn parse_quantity(raw: &str, errors: &mut ValidationErrors) -> Option<u8> {
    match raw.trim().parse::<i64>() {
        Ok(quantity) if (0..=QUANTITY_MAX).contains(&quantity) => u8::try_from(quantity).ok(),
        _ => {
            errors.push("stock", "Stock value must fall within the range of 0 to 99");
            None
        }
    }
}

fn within_chars(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Normalizes a category name for uniqueness comparison.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Escapes text for safe inclusion in HTML element content and attributes.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item_form(price: &str, quantity: &str) -> ItemForm {
        ItemForm {
            name: "Hammer".to_string(),
            description: String::new(),
            price: price.to_string(),
            quantity_in_stock: quantity.to_string(),
            categories: vec![CategoryId::generate().to_string()],
        }
    }

    #[test]
    fn category_name_too_short() {
        let form = CategoryForm {
            name: "AB".to_string(),
            description: String::new(),
        };
        let mut errors = ValidationErrors::new();
        form.check(&mut errors);
        assert_eq!(
            errors.messages(),
            vec!["Category name must be between 3 and 20 characters"]
        );
    }

    #[test]
    fn blank_category_description_gets_default() {
        let form = CategoryForm {
            name: "  Tools ".to_string(),
            description: "   ".to_string(),
        };
        let mut errors = ValidationErrors::new();
        let draft = form.check(&mut errors);
        assert!(errors.is_empty());
        assert_eq!(draft.name, "Tools");
        assert_eq!(draft.description, DEFAULT_CATEGORY_DESCRIPTION);
    }

    #[test]
    fn item_errors_accumulate() {
        let form = ItemForm {
            name: "x".to_string(),
            description: "d".repeat(51),
            price: String::new(),
            quantity_in_stock: "100".to_string(),
            categories: vec![],
        };
        let mut errors = ValidationErrors::new();
        assert!(form.check_fields(&mut errors).is_none());
        assert!(form.check_category(&mut errors).is_none());

        assert_eq!(errors.len(), 5);
        for field in ["name", "description", "price", "stock", "category"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
        assert!(errors.messages().contains(&"Please enter item price"));
    }

    #[test]
    fn valid_item_fields_parse() {
        let form = item_form("12.50", " 5 ");
        let mut errors = ValidationErrors::new();
        let fields = form.check_fields(&mut errors).unwrap();
        assert!(errors.is_empty());
        assert!((fields.price - 12.5).abs() < f64::EPSILON);
        assert_eq!(fields.quantity_in_stock, 5);
        assert_eq!(fields.description, DEFAULT_ITEM_DESCRIPTION);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        for (price, quantity) in [("abc", "1"), ("NaN", "1"), ("inf", "1"), ("5", "2.5")] {
            let mut errors = ValidationErrors::new();
            assert!(item_form(price, quantity).check_fields(&mut errors).is_none());
        }
    }

    #[test]
    fn multiple_categories_are_rejected() {
        let mut form = item_form("5", "5");
        form.categories.push(CategoryId::generate().to_string());
        let mut errors = ValidationErrors::new();
        assert!(form.check_category(&mut errors).is_none());
        assert_eq!(
            errors.messages(),
            vec!["An item must belong to exactly one category"]
        );
    }

    #[test]
    fn malformed_category_is_rejected() {
        let mut form = item_form("5", "5");
        form.categories = vec!["tools".to_string()];
        let mut errors = ValidationErrors::new();
        assert!(form.check_category(&mut errors).is_none());
        assert!(errors.has_field("category"));
    }

    #[test]
    fn escape_html_replaces_markup() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn normalize_name_ignores_case_and_padding() {
        assert_eq!(normalize_name("  TooLs "), normalize_name("tools"));
    }

    proptest! {
        #[test]
        fn category_name_length_outside_bounds_is_rejected(name in "[a-z]{0,2}|[a-z]{21,40}") {
            let form = CategoryForm { name, description: String::new() };
            let mut errors = ValidationErrors::new();
            form.check(&mut errors);
            prop_assert!(errors.has_field("name"));
        }

        #[test]
        fn category_name_length_inside_bounds_is_accepted(name in "[a-z]{3,20}") {
            let form = CategoryForm { name, description: String::new() };
            let mut errors = ValidationErrors::new();
            form.check(&mut errors);
            prop_assert!(errors.is_empty());
        }

        #[test]
        fn price_outside_range_is_rejected(price in prop_oneof![-1000.0f64..0.98, 1000.0f64..100_000.0]) {
            let mut errors = ValidationErrors::new();
            let form = item_form(&price.to_string(), "1");
            prop_assert!(form.check_fields(&mut errors).is_none());
            prop_assert!(errors.has_field("price"));
        }

        #[test]
        fn price_inside_range_is_accepted(cents in 99u32..=99_999) {
            let price = format!("{}.{:02}", cents / 100, cents % 100);
            let mut errors = ValidationErrors::new();
            prop_assert!(item_form(&price, "1").check_fields(&mut errors).is_some());
        }

        #[test]
        fn quantity_outside_range_is_rejected(quantity in prop_oneof![-500i64..0, 100i64..10_000]) {
            let mut errors = ValidationErrors::new();
            let form = item_form("10", &quantity.to_string());
            prop_assert!(form.check_fields(&mut errors).is_none());
            prop_assert!(errors.has_field("stock"));
        }

        #[test]
        fn quantity_inside_range_is_accepted(quantity in 0u8..=99) {
            let mut errors = ValidationErrors::new();
            let fields = item_form("10", &quantity.to_string()).check_fields(&mut errors);
            prop_assert_eq!(fields.map(|f| f.quantity_in_stock), Some(quantity));
        }
    }
}
