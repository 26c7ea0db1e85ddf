//! Built-in column type handlers.
//!
//! Each column type resolves to a `TypeHandler` giving `validate`, `format`,
//! and `generate`. Dispatch is a registered handler table, never a growing
//! switch over type tags.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::Value;

use super::countries;
use crate::model::TypeId;

/// Every built-in column type tag, always resolvable.
pub const BUILTIN_TAGS: &[&str] = &[
    "text",
    "textarea",
    "number",
    "integer",
    "float",
    "currency",
    "percentage",
    "date",
    "time",
    "datetime",
    "boolean",
    "email",
    "url",
    "phone",
    "country",
    "select",
    "rating",
    "color",
];

/// Context handed to value generators: which row is being produced and a
/// seeded RNG so generated samples are reproducible per table.
pub struct GenerateContext {
    pub row_index: usize,
    pub column_name: String,
    rng: StdRng,
}

impl GenerateContext {
    pub fn new(row_index: usize, column_name: impl Into<String>, seed: u64) -> Self {
        Self {
            row_index,
            column_name: column_name.into(),
            rng: StdRng::seed_from_u64(seed.wrapping_add(row_index as u64)),
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Pluggable behavior behind a column type identifier.
pub trait TypeHandler: Send + Sync {
    /// Validates a raw (trimmed, non-empty) string input.
    fn validate(&self, raw: &str) -> Result<(), String>;

    /// Formats a stored value for display.
    fn format(&self, value: &Value) -> String;

    /// Produces a sample value for generated tables.
    fn generate(&self, ctx: &mut GenerateContext) -> Value;
}

impl std::fmt::Debug for dyn TypeHandler + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TypeHandler")
    }
}

/// The built-in handler table.
pub fn builtin_handlers() -> HashMap<TypeId, Arc<dyn TypeHandler>> {
    let mut table: HashMap<TypeId, Arc<dyn TypeHandler>> = HashMap::new();
    let mut put = |tag: &str, handler: Arc<dyn TypeHandler>| {
        table.insert(TypeId::builtin(tag), handler);
    };

    put("text", Arc::new(TextHandler { long_form: false }));
    put("textarea", Arc::new(TextHandler { long_form: true }));
    put("number", Arc::new(NumericHandler::new(NumericKind::Any)));
    put("integer", Arc::new(NumericHandler::new(NumericKind::Integer)));
    put("float", Arc::new(NumericHandler::new(NumericKind::Any)));
    put("currency", Arc::new(NumericHandler::new(NumericKind::Currency)));
    put(
        "percentage",
        Arc::new(NumericHandler::new(NumericKind::Percentage)),
    );
    put("date", Arc::new(TemporalHandler::new(TemporalKind::Date)));
    put("time", Arc::new(TemporalHandler::new(TemporalKind::Time)));
    put(
        "datetime",
        Arc::new(TemporalHandler::new(TemporalKind::DateTime)),
    );
    put("boolean", Arc::new(BooleanHandler));
    put("email", Arc::new(PatternHandler::new("email", email_re())));
    put("url", Arc::new(PatternHandler::new("url", url_re())));
    put("phone", Arc::new(PatternHandler::new("phone", phone_re())));
    put("country", Arc::new(CountryHandler));
    put("select", Arc::new(SelectHandler));
    put("rating", Arc::new(RatingHandler));
    put("color", Arc::new(ColorHandler));

    table
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://\S+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9 ()\-]{7,20}$").unwrap())
}

fn color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap())
}

fn value_as_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// text / textarea

struct TextHandler {
    long_form: bool,
}

const SAMPLE_WORDS: &[&str] = &[
    "amber", "basil", "cedar", "delta", "ember", "fjord", "garnet", "harbor", "indigo", "juniper",
];

impl TypeHandler for TextHandler {
    fn validate(&self, _raw: &str) -> Result<(), String> {
        Ok(())
    }

    fn format(&self, value: &Value) -> String {
        value_as_display(value)
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        let word = SAMPLE_WORDS[ctx.rng().gen_range(0..SAMPLE_WORDS.len())];
        if self.long_form {
            Value::String(format!("{} notes for entry {}", word, ctx.row_index + 1))
        } else {
            Value::String(format!("{}-{}", word, ctx.row_index + 1))
        }
    }
}

// ---------------------------------------------------------------------------
// numeric family

#[derive(Clone, Copy)]
enum NumericKind {
    Any,
    Integer,
    Currency,
    Percentage,
}

struct NumericHandler {
    kind: NumericKind,
}

impl NumericHandler {
    fn new(kind: NumericKind) -> Self {
        Self { kind }
    }
}

impl TypeHandler for NumericHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        let parsed: f64 = raw
            .parse()
            .map_err(|_| format!("'{}' is not a number", raw))?;
        if !parsed.is_finite() {
            return Err(format!("'{}' is not a finite number", raw));
        }
        if matches!(self.kind, NumericKind::Integer) && parsed.fract() != 0.0 {
            return Err(format!("'{}' is not a whole number", raw));
        }
        Ok(())
    }

    fn format(&self, value: &Value) -> String {
        let n = match value.as_f64() {
            Some(n) => n,
            None => return value_as_display(value),
        };
        match self.kind {
            NumericKind::Any => {
                if n.fract() == 0.0 {
                    format!("{}", n as i64)
                } else {
                    format!("{}", n)
                }
            }
            NumericKind::Integer => format!("{}", n as i64),
            NumericKind::Currency => format!("{:.2}", n),
            NumericKind::Percentage => format!("{}%", n),
        }
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        match self.kind {
            NumericKind::Integer => Value::from(ctx.rng().gen_range(1..100i64)),
            NumericKind::Percentage => Value::from(ctx.rng().gen_range(0..=100i64)),
            NumericKind::Currency => {
                let cents = ctx.rng().gen_range(100..20_000i64);
                Value::from(cents as f64 / 100.0)
            }
            NumericKind::Any => Value::from((ctx.rng().gen_range(0..10_000i64) as f64) / 10.0),
        }
    }
}

// ---------------------------------------------------------------------------
// temporal family

#[derive(Clone, Copy)]
enum TemporalKind {
    Date,
    Time,
    DateTime,
}

/// Accepted date input formats, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"];
/// Accepted time input formats, tried in order.
pub const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

struct TemporalHandler {
    kind: TemporalKind,
}

impl TemporalHandler {
    fn new(kind: TemporalKind) -> Self {
        Self { kind }
    }
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

pub(crate) fn parse_time(raw: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

pub(crate) fn parse_datetime(raw: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    chrono::DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

impl TypeHandler for TemporalHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        let ok = match self.kind {
            TemporalKind::Date => parse_date(raw).is_some(),
            TemporalKind::Time => parse_time(raw).is_some(),
            TemporalKind::DateTime => parse_datetime(raw).is_some(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("'{}' is not a recognized date/time", raw))
        }
    }

    fn format(&self, value: &Value) -> String {
        let raw = match value.as_str() {
            Some(s) => s,
            None => return value_as_display(value),
        };
        match self.kind {
            TemporalKind::Date => parse_date(raw)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| raw.to_string()),
            TemporalKind::Time => parse_time(raw)
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| raw.to_string()),
            TemporalKind::DateTime => parse_datetime(raw)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| raw.to_string()),
        }
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        let days_back = ctx.rng().gen_range(0..365i64);
        let moment = Utc::now() - Duration::days(days_back);
        let rendered = match self.kind {
            TemporalKind::Date => moment.format("%Y-%m-%d").to_string(),
            TemporalKind::Time => moment.format("%H:%M:%S").to_string(),
            TemporalKind::DateTime => moment.to_rfc3339(),
        };
        Value::String(rendered)
    }
}

// ---------------------------------------------------------------------------
// boolean

pub const TRUTHY: &[&str] = &["true", "yes", "1", "y", "on"];
pub const FALSY: &[&str] = &["false", "no", "0", "n", "off"];

struct BooleanHandler;

impl TypeHandler for BooleanHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        let lowered = raw.to_lowercase();
        if TRUTHY.contains(&lowered.as_str()) || FALSY.contains(&lowered.as_str()) {
            Ok(())
        } else {
            Err(format!("'{}' is not a boolean", raw))
        }
    }

    fn format(&self, value: &Value) -> String {
        match value {
            Value::Bool(true) => "Yes".to_string(),
            Value::Bool(false) => "No".to_string(),
            other => value_as_display(other),
        }
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        Value::Bool(ctx.rng().gen_bool(0.5))
    }
}

// ---------------------------------------------------------------------------
// pattern-checked strings: email, url, phone

struct PatternHandler {
    label: &'static str,
    regex: &'static Regex,
}

impl PatternHandler {
    fn new(label: &'static str, regex: &'static Regex) -> Self {
        Self { label, regex }
    }
}

impl TypeHandler for PatternHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        if self.regex.is_match(raw) {
            Ok(())
        } else {
            Err(format!("'{}' is not a valid {}", raw, self.label))
        }
    }

    fn format(&self, value: &Value) -> String {
        value_as_display(value)
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        let i = ctx.row_index + 1;
        let rendered = match self.label {
            "email" => format!("user{}@example.com", i),
            "url" => format!("https://example.com/item/{}", i),
            _ => format!("+1 555 01{:02}", ctx.rng().gen_range(0..100)),
        };
        Value::String(rendered)
    }
}

// ---------------------------------------------------------------------------
// country

struct CountryHandler;

impl TypeHandler for CountryHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        // Format-only check: 2 or 3 Latin letters. No ISO table lookup here.
        let len = raw.chars().count();
        if (len == 2 || len == 3) && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(())
        } else {
            Err(format!("'{}' is not a 2- or 3-letter country code", raw))
        }
    }

    fn format(&self, value: &Value) -> String {
        match value.as_str() {
            Some(code) => countries::country_name(code).unwrap_or(code).to_string(),
            None => value_as_display(value),
        }
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        Value::String(countries::sample_code(ctx.rng()).to_string())
    }
}

// ---------------------------------------------------------------------------
// select / rating / color

struct SelectHandler;

impl TypeHandler for SelectHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        if raw.is_empty() {
            Err("select value is empty".to_string())
        } else {
            Ok(())
        }
    }

    fn format(&self, value: &Value) -> String {
        value_as_display(value)
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        const OPTIONS: &[&str] = &["new", "active", "archived"];
        Value::String(OPTIONS[ctx.rng().gen_range(0..OPTIONS.len())].to_string())
    }
}

struct RatingHandler;

impl TypeHandler for RatingHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        let parsed: f64 = raw
            .parse()
            .map_err(|_| format!("'{}' is not a rating", raw))?;
        if (0.0..=5.0).contains(&parsed) {
            Ok(())
        } else {
            Err(format!("rating '{}' must be between 0 and 5", raw))
        }
    }

    fn format(&self, value: &Value) -> String {
        match value.as_f64() {
            Some(n) => format!("{}/5", n),
            None => value_as_display(value),
        }
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        Value::from(ctx.rng().gen_range(0..=5i64))
    }
}

struct ColorHandler;

impl TypeHandler for ColorHandler {
    fn validate(&self, raw: &str) -> Result<(), String> {
        if color_re().is_match(raw) {
            Ok(())
        } else {
            Err(format!("'{}' is not a hex color", raw))
        }
    }

    fn format(&self, value: &Value) -> String {
        value_as_display(value).to_lowercase()
    }

    fn generate(&self, ctx: &mut GenerateContext) -> Value {
        Value::String(format!("#{:06x}", ctx.rng().gen_range(0..0x1000000u32)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handler(tag: &str) -> Arc<dyn TypeHandler> {
        builtin_handlers()
            .remove(&TypeId::builtin(tag))
            .expect("builtin handler")
    }

    #[test]
    fn test_every_builtin_tag_has_a_handler() {
        let table = builtin_handlers();
        assert_eq!(table.len(), BUILTIN_TAGS.len());
    }

    #[test]
    fn test_integer_rejects_fractions() {
        let h = handler("integer");
        assert!(h.validate("42").is_ok());
        assert!(h.validate("42.0").is_ok());
        assert!(h.validate("42.5").is_err());
        assert!(h.validate("abc").is_err());
    }

    #[test]
    fn test_number_rejects_non_finite() {
        let h = handler("number");
        assert!(h.validate("1e308").is_ok());
        assert!(h.validate("inf").is_err());
        assert!(h.validate("NaN").is_err());
    }

    #[test]
    fn test_boolean_word_sets() {
        let h = handler("boolean");
        for raw in ["true", "YES", "1", "y", "On", "false", "No", "0", "n", "OFF"] {
            assert!(h.validate(raw).is_ok(), "'{}' should validate", raw);
        }
        assert!(h.validate("maybe").is_err());
    }

    #[test]
    fn test_date_accepts_known_formats() {
        let h = handler("date");
        assert!(h.validate("2024-03-01").is_ok());
        assert!(h.validate("01/03/2024").is_ok());
        assert!(h.validate("2024/03/01").is_err()); // separator not in format set
        assert!(h.validate("yesterday").is_err());
    }

    #[test]
    fn test_country_is_format_only() {
        let h = handler("country");
        assert!(h.validate("ua").is_ok());
        assert!(h.validate("USA").is_ok());
        assert!(h.validate("X").is_err());
        assert!(h.validate("ABCD").is_err());
        assert!(h.validate("U1").is_err());
    }

    #[test]
    fn test_country_format_uses_directory() {
        let h = handler("country");
        assert_eq!(h.format(&json!("US")), "United States");
        // Unknown codes display as-is.
        assert_eq!(h.format(&json!("ZZ")), "ZZ");
    }

    #[test]
    fn test_pattern_handlers() {
        assert!(handler("email").validate("a@b.co").is_ok());
        assert!(handler("email").validate("not-an-email").is_err());
        assert!(handler("url").validate("https://x.dev/p").is_ok());
        assert!(handler("url").validate("ftp://x.dev").is_err());
        assert!(handler("phone").validate("+1 (555) 010-2030").is_ok());
        assert!(handler("phone").validate("call me").is_err());
        assert!(handler("color").validate("#a1B2c3").is_ok());
        assert!(handler("color").validate("#12").is_err());
    }

    #[test]
    fn test_rating_bounds() {
        let h = handler("rating");
        assert!(h.validate("0").is_ok());
        assert!(h.validate("5").is_ok());
        assert!(h.validate("5.5").is_err());
        assert!(h.validate("-1").is_err());
    }

    #[test]
    fn test_format_round_trips_through_validate() {
        // For types whose domain is closed under their own formatter, the
        // formatted output must validate again.
        let cases: &[(&str, Value)] = &[
            ("number", json!(12.5)),
            ("integer", json!(7)),
            ("boolean", json!(true)),
            ("date", json!("2024-03-01")),
        ];
        for (tag, value) in cases {
            let h = handler(tag);
            let rendered = h.format(value);
            let check = if *tag == "boolean" {
                // display form "Yes"/"No" maps onto the accepted word set
                h.validate(&rendered.to_lowercase())
            } else {
                h.validate(&rendered)
            };
            assert!(check.is_ok(), "{} format '{}' must re-validate", tag, rendered);
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let h = handler("integer");
        let a = h.generate(&mut GenerateContext::new(3, "qty", 99));
        let b = h.generate(&mut GenerateContext::new(3, "qty", 99));
        assert_eq!(a, b);
    }
}
