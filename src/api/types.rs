//! Wire types for the object API.
//!
//! Every field the upstream sends is optional at the wire level; what is
//! actually required for a usable record is decided downstream during
//! normalization, not here.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One page of the paginated object listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectPage {
    pub info: PageInfo,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

/// Pagination metadata attached to every page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageInfo {
    pub totalrecords: Option<u64>,
    pub pages: Option<u64>,
    pub page: Option<u64>,
    /// URL of the next page; absent on the last page.
    pub next: Option<String>,
}

/// One artifact record exactly as the upstream returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub culture: Option<String>,
    pub period: Option<String>,
    pub century: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub classification: Option<String>,
    /// Arrives as either a JSON number or a string depending on the record.
    #[serde(default, deserialize_with = "year_number_or_string")]
    pub accessionyear: Option<i64>,
    pub creditline: Option<String>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub colors: Vec<RawColor>,
}

/// One entry of a record's `images` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawImage {
    pub baseimageurl: Option<String>,
    pub rank: Option<i64>,
}

/// One entry of a record's `colors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawColor {
    pub color: Option<String>,
    pub spectrum: Option<String>,
    pub hue: Option<String>,
    pub percent: Option<f64>,
    pub css3: Option<String>,
}

/// Accept `2001`, `2001.0`, `"2001"` or `"2001.0"`; anything else maps
/// to `None` rather than failing the whole record.
fn year_number_or_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    })
}
