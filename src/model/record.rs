use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::enums::Category;
use super::tokens;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

/// Integers, integral floats and numeric strings (`"3"`) are all ids.
impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let id = match &value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        id.map(RecordId)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid record id: {value}")))
    }
}

impl RecordId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

// ---------------------------------------------------------------------------
// Record: one project or work-history row
// ---------------------------------------------------------------------------

/// A row from either table. Every field except `id` may be missing; all
/// derived values have a total fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub stack: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_impact")]
    pub impact: u64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub work_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub work_period: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub work_result: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub work_company: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub demo: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub dev_tools: Option<String>,
    #[serde(default, alias = "image_url", deserialize_with = "lenient_opt_string")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub visibility: Option<Value>,
    /// Columns this crate does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: RecordId(id),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn category_kind(&self) -> Category {
        self.category
            .as_deref()
            .map(Category::from_str_loose)
            .unwrap_or_default()
    }

    /// Lower-case stack tokens; empty when the field is absent.
    pub fn stack_tokens(&self) -> Vec<String> {
        tokens::tokenize(self.stack.as_deref().unwrap_or(""))
    }

    pub fn has_stack_token(&self, token: &str) -> bool {
        self.stack
            .as_deref()
            .is_some_and(|s| tokens::contains_token(s, token))
    }

    /// Year used for chronological grouping. See [`resolve_year`].
    pub fn year(&self) -> i32 {
        resolve_year(
            self.work_at.as_deref(),
            self.created_at.as_deref(),
            Utc::now().year(),
        )
    }

    /// Year shown on a card: the `work_at` year when it has one, else `—`.
    /// Unlike [`Record::year`] this never falls back to `created_at`.
    pub fn card_year(&self) -> String {
        self.work_at
            .as_deref()
            .and_then(|s| year_prefix(s).or_else(|| parse_date(s).map(|d| d.year())))
            .map(|y| y.to_string())
            .unwrap_or_else(|| "—".to_string())
    }

    /// Impact with thousands separators, e.g. `12,345`.
    pub fn impact_label(&self) -> String {
        group_thousands(self.impact)
    }

    /// Whether the `visibility` column marks the row as public. Accepts the
    /// spellings seen in the table: `true`, `"true"`, `"Y"`, `1`, `"1"`.
    pub fn is_visible(&self) -> bool {
        match &self.visibility {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => matches!(s.trim(), "true" | "TRUE" | "True" | "Y" | "y" | "1"),
            _ => false,
        }
    }

    /// Text column lookup by name, used by the in-memory store.
    pub fn text(&self, column: &str) -> Option<&str> {
        match column {
            "title" => Some(self.title.as_str()),
            "description" => self.description.as_deref(),
            "stack" => self.stack.as_deref(),
            "category" => self.category.as_deref(),
            "work_at" => self.work_at.as_deref(),
            "created_at" => self.created_at.as_deref(),
            "work_period" => self.work_period.as_deref(),
            "work_result" => self.work_result.as_deref(),
            "work_company" => self.work_company.as_deref(),
            _ => self.extra.get(column).and_then(Value::as_str),
        }
    }
}

// ---------------------------------------------------------------------------
// Year resolution
// ---------------------------------------------------------------------------

/// Resolve a definite year:
///
/// 1. leading four digits of `work_at`
/// 2. `work_at` parsed as a date
/// 3. `created_at` parsed the same way
/// 4. `fallback` (the current year at call sites)
pub fn resolve_year(work_at: Option<&str>, created_at: Option<&str>, fallback: i32) -> i32 {
    let work_at = work_at.unwrap_or("");
    if let Some(y) = year_prefix(work_at) {
        return y;
    }
    if let Some(d) = parse_date(work_at) {
        return d.year();
    }
    created_at
        .and_then(|s| year_prefix(s).or_else(|| parse_date(s).map(|d| d.year())))
        .unwrap_or(fallback)
}

fn year_prefix(s: &str) -> Option<i32> {
    let s = s.trim();
    let head = s.get(..4)?;
    if head.bytes().all(|b| b.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%b %d, %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

/// Accept strings, numbers and booleans as text; `null` becomes `None`.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Non-negative integer; anything else (negative, fractional, text, null)
/// becomes 0.
fn lenient_impact<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_from_prefix() {
        assert_eq!(resolve_year(Some("2022-05"), None, 1999), 2022);
    }

    #[test]
    fn test_year_falls_back_to_created_at() {
        assert_eq!(
            resolve_year(Some(""), Some("2021-01-01T00:00:00Z"), 1999),
            2021
        );
    }

    #[test]
    fn test_year_falls_back_to_given_year() {
        assert_eq!(resolve_year(Some("soon"), Some("whenever"), 1999), 1999);
        assert_eq!(resolve_year(None, None, 1999), 1999);
    }

    #[test]
    fn test_year_from_textual_date() {
        assert_eq!(resolve_year(Some("Mar 03, 2020"), None, 1999), 2020);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_impact_is_lenient() {
        let r: Record = serde_json::from_str(r#"{"id": 1, "impact": -3}"#).unwrap();
        assert_eq!(r.impact, 0);
        let r: Record = serde_json::from_str(r#"{"id": 1, "impact": "42"}"#).unwrap();
        assert_eq!(r.impact, 42);
        let r: Record = serde_json::from_str(r#"{"id": 1, "impact": "lots"}"#).unwrap();
        assert_eq!(r.impact, 0);
        let r: Record = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(r.impact, 0);
    }

    #[test]
    fn test_id_accepts_numeric_text() {
        let r: Record = serde_json::from_str(r#"{"id": " 3 "}"#).unwrap();
        assert_eq!(r.id, RecordId(3));
        let r: Record = serde_json::from_str(r#"{"id": 4.0}"#).unwrap();
        assert_eq!(r.id, RecordId(4));
        assert!(serde_json::from_str::<Record>(r#"{"id": "three"}"#).is_err());
        assert!(serde_json::from_str::<Record>(r#"{"title": "no id"}"#).is_err());
    }

    #[test]
    fn test_unknown_columns_are_kept() {
        let r: Record =
            serde_json::from_str(r#"{"id": 7, "title": "x", "priority": 2}"#).unwrap();
        assert_eq!(r.extra.get("priority"), Some(&Value::from(2)));
    }

    #[test]
    fn test_visibility_spellings() {
        for v in [r#"true"#, r#""Y""#, r#"1"#, r#""1""#, r#""true""#] {
            let r: Record =
                serde_json::from_str(&format!(r#"{{"id": 1, "visibility": {v}}}"#)).unwrap();
            assert!(r.is_visible(), "{v} should be visible");
        }
        let r: Record = serde_json::from_str(r#"{"id": 1, "visibility": false}"#).unwrap();
        assert!(!r.is_visible());
    }

    #[test]
    fn test_card_year() {
        let mut r = Record::new(1, "t");
        assert_eq!(r.card_year(), "—");
        r.work_at = Some("2019-11-02".into());
        assert_eq!(r.card_year(), "2019");
    }
}
