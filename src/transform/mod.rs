//! Normalization of raw API records into loadable rows.
//!
//! A record either normalizes completely (one metadata row plus its media
//! and color rows) or is rejected as a whole; there is no partial output
//! for a single record. Missing optional fields pass through as `None`
//! and become SQL NULL downstream.

pub mod error;
pub mod types;

pub use error::TransformError;
pub use types::{ColorRow, MediaRow, MetadataRow, TransformedRecord};

use crate::api::RawRecord;

/// Normalize one raw record.
///
/// `offset` is the record's position within the current run and is only
/// used to label rejections, since a record without an id has no better
/// handle for log messages.
pub fn transform(record: RawRecord, offset: u64) -> Result<TransformedRecord, TransformError> {
    let id = record.id.ok_or(TransformError::MissingId { offset })?;

    let metadata = MetadataRow {
        id,
        title: record.title,
        culture: record.culture,
        period: record.period,
        century: record.century,
        medium: record.medium,
        dimensions: record.dimensions,
        description: record.description,
        department: record.department,
        classification: record.classification,
        accessionyear: record.accessionyear,
        creditline: record.creditline,
    };

    // An image entry without a URL has nothing to point at; drop it.
    let media = record
        .images
        .into_iter()
        .filter_map(|image| {
            image.baseimageurl.map(|url| MediaRow {
                objectid: id,
                url,
                rank: image.rank,
            })
        })
        .collect();

    let colors = record
        .colors
        .into_iter()
        .map(|entry| ColorRow {
            objectid: id,
            color: entry.color,
            spectrum: entry.spectrum,
            hue: entry.hue,
            percent: entry.percent,
            css3: entry.css3,
        })
        .collect();

    Ok(TransformedRecord {
        metadata,
        media,
        colors,
    })
}
