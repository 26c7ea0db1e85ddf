//! Column naming rules.
//!
//! User-supplied display names are restricted to Latin letters and spaces;
//! everything else is rejected rather than silently stripped to nothing.
//! The stored form is camelCase; the display form is always derived.

use std::sync::OnceLock;

use regex::Regex;

fn display_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z ]+$").unwrap())
}

/// Converts a display name to the internal camelCase identifier.
///
/// Rejects input containing digits, punctuation, or non-Latin characters,
/// and rejects names that clean down to nothing.
pub fn internal_name(display: &str) -> Result<String, String> {
    let trimmed = display.trim();
    if trimmed.is_empty() {
        return Err("column name is empty".to_string());
    }
    if !display_name_re().is_match(trimmed) {
        return Err(format!(
            "column name '{}' may only contain Latin letters and spaces",
            trimmed
        ));
    }

    let mut out = String::with_capacity(trimmed.len());
    for (i, word) in trimmed.split_whitespace().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }

    if out.is_empty() {
        return Err("column name is empty after cleaning".to_string());
    }
    Ok(out)
}

/// Derives the display form from an internal camelCase name,
/// e.g. `unitPrice` → `Unit Price`.
pub fn display_name(internal: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in internal.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_name_camel_cases() {
        assert_eq!(internal_name("Unit Price").unwrap(), "unitPrice");
        assert_eq!(internal_name("quantity").unwrap(), "quantity");
        assert_eq!(internal_name("  Available  Stock ").unwrap(), "availableStock");
    }

    #[test]
    fn test_internal_name_rejects_digits_and_punctuation() {
        assert!(internal_name("price2").is_err());
        assert!(internal_name("unit-price").is_err());
        assert!(internal_name("price!").is_err());
    }

    #[test]
    fn test_internal_name_rejects_non_latin() {
        assert!(internal_name("ціна").is_err());
        assert!(internal_name("価格").is_err());
    }

    #[test]
    fn test_internal_name_rejects_empty() {
        assert!(internal_name("").is_err());
        assert!(internal_name("   ").is_err());
    }

    #[test]
    fn test_display_name_round_trip() {
        assert_eq!(display_name("unitPrice"), "Unit Price");
        assert_eq!(display_name("quantity"), "Quantity");
        assert_eq!(
            internal_name(&display_name("availableStock")).unwrap(),
            "availableStock"
        );
    }
}
