//! Normalized row types produced from raw records.

/// One row of `artifact_metadata`, keyed by the upstream artifact id.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub id: i64,
    pub title: Option<String>,
    pub culture: Option<String>,
    pub period: Option<String>,
    pub century: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub classification: Option<String>,
    pub accessionyear: Option<i64>,
    pub creditline: Option<String>,
}

/// One row of `artifact_media`. The URL is the whole point of the row,
/// so it is not optional.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRow {
    pub objectid: i64,
    pub url: String,
    pub rank: Option<i64>,
}

/// One row of `artifact_colors`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRow {
    pub objectid: i64,
    pub color: Option<String>,
    pub spectrum: Option<String>,
    pub hue: Option<String>,
    pub percent: Option<f64>,
    pub css3: Option<String>,
}

/// Everything one raw record normalizes into: exactly one metadata row
/// plus zero or more media and color rows, all sharing the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    pub metadata: MetadataRow,
    pub media: Vec<MediaRow>,
    pub colors: Vec<ColorRow>,
}
