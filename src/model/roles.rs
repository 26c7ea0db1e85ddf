//! Commerce-relevant column roles, matched by internal name.
//!
//! Roles are a naming convention, not a stored flag: a `sale` table's price
//! and quantity columns are whichever columns carry those names.

use super::{Column, Purpose};

const QUANTITY_NAMES: &[&str] = &["quantity", "qty", "stock"];
const PRICE_NAMES: &[&str] = &["price", "cost"];
const RENT_NAMES: &[&str] = &["fee", "used", "available"];

/// The role a column name maps to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Quantity,
    Price,
    RentBookkeeping,
}

/// Resolves the role of an internal column name.
pub fn role_of(name: &str) -> Option<ColumnRole> {
    let lowered = name.to_lowercase();
    if QUANTITY_NAMES.contains(&lowered.as_str()) {
        Some(ColumnRole::Quantity)
    } else if PRICE_NAMES.contains(&lowered.as_str()) {
        Some(ColumnRole::Price)
    } else if RENT_NAMES.contains(&lowered.as_str()) {
        Some(ColumnRole::RentBookkeeping)
    } else {
        None
    }
}

/// Whether a column is protected under the given table purpose.
pub fn is_protected(name: &str, purpose: Purpose) -> bool {
    match (purpose, role_of(name)) {
        (Purpose::Sale, Some(ColumnRole::Quantity | ColumnRole::Price)) => true,
        (Purpose::Rent, Some(ColumnRole::Price | ColumnRole::RentBookkeeping)) => true,
        _ => false,
    }
}

/// The quantity-role column of a table, if one exists.
pub fn quantity_column(columns: &[Column]) -> Option<&Column> {
    columns
        .iter()
        .find(|c| role_of(&c.name) == Some(ColumnRole::Quantity))
}

/// The price-role column of a table, if one exists.
pub fn price_column(columns: &[Column]) -> Option<&Column> {
    columns
        .iter()
        .find(|c| role_of(&c.name) == Some(ColumnRole::Price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_matching_is_case_insensitive() {
        assert_eq!(role_of("Quantity"), Some(ColumnRole::Quantity));
        assert_eq!(role_of("qty"), Some(ColumnRole::Quantity));
        assert_eq!(role_of("price"), Some(ColumnRole::Price));
        assert_eq!(role_of("available"), Some(ColumnRole::RentBookkeeping));
        assert_eq!(role_of("color"), None);
    }

    #[test]
    fn test_protection_depends_on_purpose() {
        assert!(is_protected("price", Purpose::Sale));
        assert!(is_protected("stock", Purpose::Sale));
        assert!(!is_protected("fee", Purpose::Sale));
        assert!(is_protected("fee", Purpose::Rent));
        assert!(is_protected("price", Purpose::Rent));
        assert!(!is_protected("price", Purpose::Default));
    }
}
