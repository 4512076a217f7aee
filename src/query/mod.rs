//! Fixed catalog of named, parameterized, read-only queries.
//!
//! Every query is a `SELECT` with declared parameters and ordered
//! output. Callers address queries by kebab-case name and supply
//! parameters as name/value string pairs; validation happens here so
//! a bad parameter never reaches the store.

pub mod error;
pub mod types;

pub use error::QueryError;
pub use types::{ParamSpec, ParamType, QueryGroup, QueryResult};

use crate::store::{ArtifactStore, CellValue};

/// Every query in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    // Metadata
    ByCenturyAndCulture,
    DistinctCultures,
    ByPeriod,
    TitlesByAccessionYear,
    CountPerDepartment,
    CountPerCulture,
    CountPerClassification,
    MostCommonMediums,
    ArtifactsMissingMedium,
    DepartmentCountsForCulture,
    CountByCreditLine,
    AccessionsPerYear,
    // Media
    ArtifactsWithMinImages,
    ArtifactsWithoutMedia,
    AverageImagesPerArtifact,
    TopRankedImages,
    ImagesPerClassification,
    // Colors
    DistinctHues,
    TopColors,
    AverageCoveragePerHue,
    ColorsForArtifact,
    TotalColorEntries,
    // Joins
    TitlesWithHuesForCulture,
    HueDistributionForClassification,
    ArtifactsPerHue,
}

impl QueryKind {
    /// The full catalog, in listing order.
    pub const ALL: [QueryKind; 25] = [
        Self::ByCenturyAndCulture,
        Self::DistinctCultures,
        Self::ByPeriod,
        Self::TitlesByAccessionYear,
        Self::CountPerDepartment,
        Self::CountPerCulture,
        Self::CountPerClassification,
        Self::MostCommonMediums,
        Self::ArtifactsMissingMedium,
        Self::DepartmentCountsForCulture,
        Self::CountByCreditLine,
        Self::AccessionsPerYear,
        Self::ArtifactsWithMinImages,
        Self::ArtifactsWithoutMedia,
        Self::AverageImagesPerArtifact,
        Self::TopRankedImages,
        Self::ImagesPerClassification,
        Self::DistinctHues,
        Self::TopColors,
        Self::AverageCoveragePerHue,
        Self::ColorsForArtifact,
        Self::TotalColorEntries,
        Self::TitlesWithHuesForCulture,
        Self::HueDistributionForClassification,
        Self::ArtifactsPerHue,
    ];

    /// Stable kebab-case name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ByCenturyAndCulture => "by-century-and-culture",
            Self::DistinctCultures => "distinct-cultures",
            Self::ByPeriod => "by-period",
            Self::TitlesByAccessionYear => "titles-by-accession-year",
            Self::CountPerDepartment => "count-per-department",
            Self::CountPerCulture => "count-per-culture",
            Self::CountPerClassification => "count-per-classification",
            Self::MostCommonMediums => "most-common-mediums",
            Self::ArtifactsMissingMedium => "artifacts-missing-medium",
            Self::DepartmentCountsForCulture => "department-counts-for-culture",
            Self::CountByCreditLine => "count-by-credit-line",
            Self::AccessionsPerYear => "accessions-per-year",
            Self::ArtifactsWithMinImages => "artifacts-with-min-images",
            Self::ArtifactsWithoutMedia => "artifacts-without-media",
            Self::AverageImagesPerArtifact => "average-images-per-artifact",
            Self::TopRankedImages => "top-ranked-images",
            Self::ImagesPerClassification => "images-per-classification",
            Self::DistinctHues => "distinct-hues",
            Self::TopColors => "top-colors",
            Self::AverageCoveragePerHue => "average-coverage-per-hue",
            Self::ColorsForArtifact => "colors-for-artifact",
            Self::TotalColorEntries => "total-color-entries",
            Self::TitlesWithHuesForCulture => "titles-with-hues-for-culture",
            Self::HueDistributionForClassification => "hue-distribution-for-classification",
            Self::ArtifactsPerHue => "artifacts-per-hue",
        }
    }

    /// Resolve a name from the command line.
    pub fn from_name(name: &str) -> Result<Self, QueryError> {
        Self::ALL
            .iter()
            .find(|kind| kind.name() == name)
            .copied()
            .ok_or_else(|| QueryError::UnknownQuery(name.to_string()))
    }

    /// One-line description for the `queries` listing.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ByCenturyAndCulture => "Artifacts matching a century and culture",
            Self::DistinctCultures => "Every culture represented in the store",
            Self::ByPeriod => "Artifacts from a named period",
            Self::TitlesByAccessionYear => "Titles ordered by accession year, newest first",
            Self::CountPerDepartment => "Artifact count per department",
            Self::CountPerCulture => "Artifact count per culture",
            Self::CountPerClassification => "Artifact count per classification",
            Self::MostCommonMediums => "The ten most common mediums",
            Self::ArtifactsMissingMedium => "Artifacts with no recorded medium",
            Self::DepartmentCountsForCulture => "Department counts for one culture",
            Self::CountByCreditLine => "How many artifacts match a credit line",
            Self::AccessionsPerYear => "Accession counts per year, newest first",
            Self::ArtifactsWithMinImages => "Artifacts with at least N images",
            Self::ArtifactsWithoutMedia => "Artifacts with no media rows",
            Self::AverageImagesPerArtifact => "Average image count across artifacts with media",
            Self::TopRankedImages => "The twenty best-ranked images",
            Self::ImagesPerClassification => "Image counts per classification",
            Self::DistinctHues => "Every hue recorded in the store",
            Self::TopColors => "The ten most frequent colors",
            Self::AverageCoveragePerHue => "Average coverage percentage per hue",
            Self::ColorsForArtifact => "Color rows for one artifact",
            Self::TotalColorEntries => "Total number of color rows",
            Self::TitlesWithHuesForCulture => "Titles and hues for one culture",
            Self::HueDistributionForClassification => "Hue counts within one classification",
            Self::ArtifactsPerHue => "Distinct artifact count per hue",
        }
    }

    /// Which catalog section this query belongs to.
    pub fn group(&self) -> QueryGroup {
        match self {
            Self::ByCenturyAndCulture
            | Self::DistinctCultures
            | Self::ByPeriod
            | Self::TitlesByAccessionYear
            | Self::CountPerDepartment
            | Self::CountPerCulture
            | Self::CountPerClassification
            | Self::MostCommonMediums
            | Self::ArtifactsMissingMedium
            | Self::DepartmentCountsForCulture
            | Self::CountByCreditLine
            | Self::AccessionsPerYear => QueryGroup::Metadata,
            Self::ArtifactsWithMinImages
            | Self::ArtifactsWithoutMedia
            | Self::AverageImagesPerArtifact
            | Self::TopRankedImages
            | Self::ImagesPerClassification => QueryGroup::Media,
            Self::DistinctHues
            | Self::TopColors
            | Self::AverageCoveragePerHue
            | Self::ColorsForArtifact
            | Self::TotalColorEntries => QueryGroup::Colors,
            Self::TitlesWithHuesForCulture
            | Self::HueDistributionForClassification
            | Self::ArtifactsPerHue => QueryGroup::Joins,
        }
    }

    /// Declared parameters, in bind order.
    pub fn params(&self) -> &'static [ParamSpec] {
        const CENTURY_AND_CULTURE: [ParamSpec; 2] = [
            ParamSpec {
                name: "century",
                ty: ParamType::Text,
            },
            ParamSpec {
                name: "culture",
                ty: ParamType::Text,
            },
        ];
        const PERIOD: [ParamSpec; 1] = [ParamSpec {
            name: "period",
            ty: ParamType::Text,
        }];
        const CULTURE: [ParamSpec; 1] = [ParamSpec {
            name: "culture",
            ty: ParamType::Text,
        }];
        const CREDIT: [ParamSpec; 1] = [ParamSpec {
            name: "credit",
            ty: ParamType::Text,
        }];
        const MIN_IMAGES: [ParamSpec; 1] = [ParamSpec {
            name: "min-images",
            ty: ParamType::Integer,
        }];
        const ARTIFACT_ID: [ParamSpec; 1] = [ParamSpec {
            name: "id",
            ty: ParamType::Integer,
        }];
        const CLASSIFICATION: [ParamSpec; 1] = [ParamSpec {
            name: "classification",
            ty: ParamType::Text,
        }];

        match self {
            Self::ByCenturyAndCulture => &CENTURY_AND_CULTURE,
            Self::ByPeriod => &PERIOD,
            Self::DepartmentCountsForCulture | Self::TitlesWithHuesForCulture => &CULTURE,
            Self::CountByCreditLine => &CREDIT,
            Self::ArtifactsWithMinImages => &MIN_IMAGES,
            Self::ColorsForArtifact => &ARTIFACT_ID,
            Self::HueDistributionForClassification => &CLASSIFICATION,
            _ => &[],
        }
    }

    /// The SQL behind this query.
    pub fn sql(&self) -> &'static str {
        match self {
            Self::ByCenturyAndCulture => {
                "SELECT id, title, culture, century, classification \
                 FROM artifact_metadata \
                 WHERE century LIKE '%' || ?1 || '%' AND culture LIKE '%' || ?2 || '%' \
                 ORDER BY id LIMIT 100"
            }
            Self::DistinctCultures => {
                "SELECT DISTINCT culture FROM artifact_metadata \
                 WHERE culture IS NOT NULL ORDER BY culture"
            }
            Self::ByPeriod => {
                "SELECT id, title, period, culture FROM artifact_metadata \
                 WHERE period LIKE '%' || ?1 || '%' ORDER BY id LIMIT 100"
            }
            Self::TitlesByAccessionYear => {
                "SELECT title, accessionyear FROM artifact_metadata \
                 WHERE accessionyear IS NOT NULL \
                 ORDER BY accessionyear DESC, title LIMIT 100"
            }
            Self::CountPerDepartment => {
                "SELECT department, COUNT(*) AS artifact_count FROM artifact_metadata \
                 WHERE department IS NOT NULL GROUP BY department \
                 ORDER BY artifact_count DESC, department"
            }
            Self::CountPerCulture => {
                "SELECT culture, COUNT(*) AS artifact_count FROM artifact_metadata \
                 WHERE culture IS NOT NULL GROUP BY culture \
                 ORDER BY artifact_count DESC, culture"
            }
            Self::CountPerClassification => {
                "SELECT classification, COUNT(*) AS artifact_count FROM artifact_metadata \
                 WHERE classification IS NOT NULL GROUP BY classification \
                 ORDER BY artifact_count DESC, classification"
            }
            Self::MostCommonMediums => {
                "SELECT medium, COUNT(*) AS artifact_count FROM artifact_metadata \
                 WHERE medium IS NOT NULL GROUP BY medium \
                 ORDER BY artifact_count DESC, medium LIMIT 10"
            }
            Self::ArtifactsMissingMedium => {
                "SELECT id, title, classification FROM artifact_metadata \
                 WHERE medium IS NULL ORDER BY id LIMIT 100"
            }
            Self::DepartmentCountsForCulture => {
                "SELECT department, COUNT(*) AS artifact_count FROM artifact_metadata \
                 WHERE culture LIKE '%' || ?1 || '%' AND department IS NOT NULL \
                 GROUP BY department ORDER BY artifact_count DESC, department"
            }
            Self::CountByCreditLine => {
                "SELECT COUNT(*) AS artifact_count FROM artifact_metadata \
                 WHERE creditline LIKE '%' || ?1 || '%'"
            }
            Self::AccessionsPerYear => {
                "SELECT accessionyear, COUNT(*) AS artifact_count FROM artifact_metadata \
                 WHERE accessionyear IS NOT NULL GROUP BY accessionyear \
                 ORDER BY accessionyear DESC"
            }
            Self::ArtifactsWithMinImages => {
                "SELECT m.id, m.title, COUNT(*) AS image_count \
                 FROM artifact_metadata m \
                 JOIN artifact_media am ON m.id = am.objectid \
                 GROUP BY m.id HAVING image_count >= ?1 \
                 ORDER BY image_count DESC, m.id"
            }
            Self::ArtifactsWithoutMedia => {
                "SELECT id, title FROM artifact_metadata \
                 WHERE id NOT IN (SELECT objectid FROM artifact_media) \
                 ORDER BY id LIMIT 100"
            }
            Self::AverageImagesPerArtifact => {
                "SELECT ROUND(AVG(image_count), 2) AS avg_images \
                 FROM (SELECT COUNT(*) AS image_count FROM artifact_media GROUP BY objectid)"
            }
            Self::TopRankedImages => {
                "SELECT am.objectid, m.title, am.url, am.rank \
                 FROM artifact_media am \
                 JOIN artifact_metadata m ON am.objectid = m.id \
                 WHERE am.rank IS NOT NULL \
                 ORDER BY am.rank ASC, am.objectid LIMIT 20"
            }
            Self::ImagesPerClassification => {
                "SELECT m.classification, COUNT(*) AS image_count \
                 FROM artifact_metadata m \
                 JOIN artifact_media am ON m.id = am.objectid \
                 WHERE m.classification IS NOT NULL GROUP BY m.classification \
                 ORDER BY image_count DESC, m.classification"
            }
            Self::DistinctHues => {
                "SELECT DISTINCT hue FROM artifact_colors \
                 WHERE hue IS NOT NULL ORDER BY hue"
            }
            Self::TopColors => {
                "SELECT color, COUNT(*) AS usage_count FROM artifact_colors \
                 WHERE color IS NOT NULL GROUP BY color \
                 ORDER BY usage_count DESC, color LIMIT 10"
            }
            Self::AverageCoveragePerHue => {
                "SELECT hue, ROUND(AVG(percent), 2) AS avg_coverage FROM artifact_colors \
                 WHERE hue IS NOT NULL GROUP BY hue \
                 ORDER BY avg_coverage DESC, hue"
            }
            Self::ColorsForArtifact => {
                "SELECT objectid, color, hue, percent, css3 FROM artifact_colors \
                 WHERE objectid = ?1 ORDER BY percent DESC"
            }
            Self::TotalColorEntries => {
                "SELECT COUNT(*) AS total_colors FROM artifact_colors"
            }
            Self::TitlesWithHuesForCulture => {
                "SELECT m.title, c.hue \
                 FROM artifact_metadata m \
                 JOIN artifact_colors c ON m.id = c.objectid \
                 WHERE m.culture LIKE '%' || ?1 || '%' \
                 ORDER BY m.id LIMIT 100"
            }
            Self::HueDistributionForClassification => {
                "SELECT c.hue, COUNT(*) AS color_count \
                 FROM artifact_metadata m \
                 JOIN artifact_colors c ON m.id = c.objectid \
                 WHERE m.classification LIKE '%' || ?1 || '%' AND c.hue IS NOT NULL \
                 GROUP BY c.hue ORDER BY color_count DESC, c.hue"
            }
            Self::ArtifactsPerHue => {
                "SELECT c.hue, COUNT(DISTINCT m.id) AS artifact_count \
                 FROM artifact_metadata m \
                 JOIN artifact_colors c ON m.id = c.objectid \
                 WHERE c.hue IS NOT NULL GROUP BY c.hue \
                 ORDER BY artifact_count DESC, c.hue"
            }
        }
    }
}

/// Validate parameters, bind them in declared order, and run the query.
///
/// Validation rejects the whole call before anything reaches the store,
/// so there is never a partial result.
pub async fn run_query(
    store: &dyn ArtifactStore,
    kind: QueryKind,
    supplied: &[(String, String)],
) -> Result<QueryResult, QueryError> {
    let specs = kind.params();

    for (name, _) in supplied {
        if !specs.iter().any(|spec| spec.name == name) {
            return Err(QueryError::UnknownParam {
                query: kind.name(),
                name: name.clone(),
            });
        }
    }

    let mut bound: Vec<CellValue> = Vec::with_capacity(specs.len());
    for spec in specs {
        let value = supplied
            .iter()
            .find(|(name, _)| name == spec.name)
            .map(|(_, value)| value.as_str())
            .ok_or(QueryError::MissingParam {
                query: kind.name(),
                name: spec.name,
            })?;
        bound.push(spec.parse(value)?);
    }

    let output = store.select(kind.sql(), &bound).await?;
    Ok(output.into())
}
