use crate::extract::text::non_empty;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Keys of an exported record, in canonical column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Asin,
    Url,
    Title,
    Price,
    Rating,
    RatingCount,
    Availability,
    Images,
    Features,
    Description,
    ScrapedAt,
}

impl RecordKey {
    pub const ALL: [RecordKey; 11] = [
        RecordKey::Asin,
        RecordKey::Url,
        RecordKey::Title,
        RecordKey::Price,
        RecordKey::Rating,
        RecordKey::RatingCount,
        RecordKey::Availability,
        RecordKey::Images,
        RecordKey::Features,
        RecordKey::Description,
        RecordKey::ScrapedAt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Asin => "asin",
            Self::Url => "url",
            Self::Title => "title",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::RatingCount => "rating_count",
            Self::Availability => "availability",
            Self::Images => "images",
            Self::Features => "features",
            Self::Description => "description",
            Self::ScrapedAt => "scraped_at",
        }
    }
}

/// Raw field values handed to [`ProductRecord::new`]
///
/// Values are cleaned on construction; callers do not need to trim them.
#[derive(Debug, Clone, Default)]
pub struct RecordFields {
    pub title: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub availability: Option<String>,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub description: Option<String>,
}

/// Normalized data of one product page
///
/// Every present field is non-empty after trimming. Absent optional fields,
/// an empty image set and an empty feature list are omitted when the record
/// is serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    #[serde(rename = "asin", skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,

    #[serde(rename = "url")]
    source_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    rating_count: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    availability: Option<String>,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    images: BTreeSet<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    features: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(rename = "scraped_at")]
    fetched_at: DateTime<Utc>,
}

fn clean(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(non_empty)
}

impl ProductRecord {
    /// Builds a record, trimming every value and dropping empty ones
    pub fn new(
        identifier: Option<String>,
        source_url: &str,
        fetched_at: DateTime<Utc>,
        fields: RecordFields,
    ) -> Self {
        Self {
            identifier: clean(identifier),
            source_url: source_url.trim().to_string(),
            title: clean(fields.title),
            price: clean(fields.price),
            rating: clean(fields.rating),
            rating_count: clean(fields.rating_count),
            availability: clean(fields.availability),
            images: fields.images.iter().filter_map(|v| non_empty(v)).collect(),
            features: fields.features.iter().filter_map(|v| non_empty(v)).collect(),
            description: clean(fields.description),
            fetched_at,
        }
    }

    /// The catalog item identifier (ASIN)
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }

    pub fn rating(&self) -> Option<&str> {
        self.rating.as_deref()
    }

    pub fn rating_count(&self) -> Option<&str> {
        self.rating_count.as_deref()
    }

    pub fn availability(&self) -> Option<&str> {
        self.availability.as_deref()
    }

    /// Distinct image URLs, in sorted order
    pub fn images(&self) -> &BTreeSet<String> {
        &self.images
    }

    /// Feature bullets, in page order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Returns true if the record carries a value for `key`
    pub fn has(&self, key: RecordKey) -> bool {
        match key {
            RecordKey::Asin => self.identifier.is_some(),
            RecordKey::Url | RecordKey::ScrapedAt => true,
            RecordKey::Title => self.title.is_some(),
            RecordKey::Price => self.price.is_some(),
            RecordKey::Rating => self.rating.is_some(),
            RecordKey::RatingCount => self.rating_count.is_some(),
            RecordKey::Availability => self.availability.is_some(),
            RecordKey::Images => !self.images.is_empty(),
            RecordKey::Features => !self.features.is_empty(),
            RecordKey::Description => self.description.is_some(),
        }
    }

    /// Keys this record would serialize, in canonical order
    pub fn present_keys(&self) -> Vec<RecordKey> {
        RecordKey::ALL
            .into_iter()
            .filter(|key| self.has(*key))
            .collect()
    }
}
