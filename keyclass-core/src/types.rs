use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

pub type CategoryId = i64;
pub type RecordId = Uuid;

/// Label reported when no token matched any keyword.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

// ===== DICTIONARY TABLES =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One dictionary row: a literal keyword contributing `percent` to a category.
///
/// `weight` is carried through from the source table but does not take part
/// in scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordWeight {
    pub key: String,
    #[serde(default, deserialize_with = "lenient_optional_f64")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percent: f64,
    #[serde(alias = "table_id")]
    pub category_id: CategoryId,
}

impl KeywordWeight {
    pub fn new(key: impl Into<String>, percent: f64, category_id: CategoryId) -> Self {
        Self {
            key: key.into(),
            weight: None,
            percent,
            category_id,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Parse a numeric cell that may have been stored as text.
///
/// Empty strings are treated as missing. NaN and infinities are rejected.
pub fn parse_numeric_cell(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    finite_cell(value).map(Some)
}

/// Reject NaN and infinities, which would poison score sums.
pub(crate) fn finite_cell(value: f64) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{value}' is not a finite number"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericCell {
    Number(f64),
    Text(String),
    Null(()),
}

fn numeric_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match NumericCell::deserialize(deserializer)? {
        NumericCell::Number(n) => finite_cell(n).map(Some).map_err(de::Error::custom),
        NumericCell::Text(s) => parse_numeric_cell(&s).map_err(de::Error::custom),
        NumericCell::Null(()) => Ok(None),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(numeric_cell(deserializer)?.unwrap_or(0.0))
}

fn lenient_optional_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    numeric_cell(deserializer)
}

// ===== SCORING =====

/// Accumulated score per category, in category-table order.
///
/// Serializes as a JSON object keyed by category id. Order is significant:
/// it decides ties between equal maximum scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMap {
    entries: Vec<(CategoryId, f64)>,
}

impl ScoreMap {
    /// One zeroed entry per distinct id; the first occurrence fixes the position.
    pub fn zeroed<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = CategoryId>,
    {
        let mut seen = HashSet::new();
        let entries = ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .map(|id| (id, 0.0))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: CategoryId) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Add to the entry at `slot` (a position previously obtained from `slot_of`).
    pub(crate) fn add_at(&mut self, slot: usize, amount: f64) {
        if let Some((_, score)) = self.entries.get_mut(slot) {
            *score += amount;
        }
    }

    pub(crate) fn slot_of(&self, id: CategoryId) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| *existing == id)
    }

    /// Adds `amount` to a known category. Unknown ids are ignored.
    pub fn add(&mut self, id: CategoryId, amount: f64) -> bool {
        match self.slot_of(id) {
            Some(slot) => {
                self.add_at(slot, amount);
                true
            }
            None => false,
        }
    }

    pub fn all_zero(&self) -> bool {
        self.entries.iter().all(|(_, score)| *score == 0.0)
    }

    /// Highest-scoring entry; the earliest entry wins ties.
    pub fn best(&self) -> Option<(CategoryId, f64)> {
        let mut best: Option<(CategoryId, f64)> = None;
        for &(id, score) in &self.entries {
            match best {
                Some((_, top)) if score <= top => {}
                _ if score.is_nan() => {}
                _ => best = Some((id, score)),
            }
        }
        best
    }
}

impl Serialize for ScoreMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, score) in &self.entries {
            map.serialize_entry(id, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScoreMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoreMapVisitor;

        impl<'de> Visitor<'de> for ScoreMapVisitor {
            type Value = ScoreMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category id to score")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ScoreMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, score)) = access.next_entry::<CategoryId, f64>()? {
                    entries.push((id, score));
                }
                Ok(ScoreMap { entries })
            }
        }

        deserializer.deserialize_map(ScoreMapVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub predicted_category: String,
    /// Raw accumulated score of the winner. Not a probability.
    pub confidence: f64,
    pub all_scores: ScoreMap,
}

impl ClassificationResult {
    pub fn is_unknown(&self) -> bool {
        self.predicted_category == UNKNOWN_CATEGORY
    }
}

// ===== STORED RECORDS =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryRecord {
    pub id: RecordId,
    pub name: String,
    pub file_name: String,
    pub content_hash: String,
    pub category_count: usize,
    pub keyword_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentSource {
    File {
        file_name: String,
        content_hash: String,
    },
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: RecordId,
    pub name: String,
    pub source: DocumentSource,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// File name offered when the stored content is downloaded.
    pub fn download_name(&self) -> String {
        match &self.source {
            DocumentSource::File { file_name, .. } => file_name.clone(),
            DocumentSource::Text => format!("{}.txt", self.name),
        }
    }
}

/// Stored content of a document, as uploaded.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent {
    File { file_name: String, bytes: Vec<u8> },
    Text(String),
}

impl DocumentContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DocumentContent::File { bytes, .. } => bytes,
            DocumentContent::Text(text) => text.as_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    #[serde(rename = "classification_id")]
    pub id: RecordId,
    pub document_id: RecordId,
    #[serde(rename = "database_id")]
    pub dictionary_id: RecordId,
    #[serde(rename = "classification_result")]
    pub result: ClassificationResult,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub classifier_version: String,
}
