//! Keyword dictionaries
//!
//! A dictionary is the pair of tables the classifier scores against:
//! categories (`id`, `name`) and keyword weights (`key`, `weight`, `percent`,
//! `category_id`). Two on-disk layouts are accepted:
//!
//! - a SQLite file with a `tables` table (`id`, `name`, optional
//!   `category_type`) and a `keys` table (`key`, `weight`, `percent`,
//!   `table_id`)
//! - a YAML or JSON document with `categories` and `keywords` lists

use crate::error::{KeyclassError, Result};
use crate::types::*;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::debug;

const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub keywords: Vec<KeywordWeight>,
}

impl Dictionary {
    pub fn new(categories: Vec<Category>, keywords: Vec<KeywordWeight>) -> Self {
        Self {
            categories,
            keywords,
        }
    }

    /// Load from uploaded bytes, detecting SQLite by its file header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(SQLITE_MAGIC) {
            // rusqlite needs a real file to open
            let mut spill = tempfile::NamedTempFile::new()?;
            spill.write_all(bytes)?;
            spill.flush()?;
            return Self::from_sqlite_path(spill.path());
        }

        let text = std::str::from_utf8(bytes).map_err(|_| {
            KeyclassError::InvalidDictionary(
                "expected a SQLite database or a UTF-8 YAML/JSON document".to_string(),
            )
        })?;
        Self::from_yaml_str(text)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse the YAML/JSON layout. JSON is accepted as a YAML subset.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let dictionary: Dictionary = serde_yaml::from_str(text)
            .map_err(|e| KeyclassError::InvalidDictionary(e.to_string()))?;
        debug!(
            categories = dictionary.categories.len(),
            keywords = dictionary.keywords.len(),
            "loaded YAML dictionary"
        );
        Ok(dictionary)
    }

    pub fn from_sqlite_path(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let categories = read_categories(&conn)?;
        let keywords = read_keywords(&conn)?;
        debug!(
            categories = categories.len(),
            keywords = keywords.len(),
            "loaded SQLite dictionary"
        );
        Ok(Self {
            categories,
            keywords,
        })
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }
}

fn read_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM tables ORDER BY rowid")
        .map_err(missing_table("tables"))?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut categories = Vec::new();
    for row in rows {
        let (id, name) = row?;
        categories.push(Category::new(id, name.unwrap_or_default()));
    }
    Ok(categories)
}

fn read_keywords(conn: &Connection) -> Result<Vec<KeywordWeight>> {
    let mut stmt = conn
        .prepare("SELECT key, weight, percent, table_id FROM keys ORDER BY rowid")
        .map_err(missing_table("keys"))?;
    let mut rows = stmt.query([])?;

    let mut keywords = Vec::new();
    while let Some(row) = rows.next()? {
        let key = match row.get_ref(0)? {
            ValueRef::Text(raw) => String::from_utf8_lossy(raw).into_owned(),
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => f.to_string(),
            ValueRef::Null | ValueRef::Blob(_) => continue,
        };
        let weight = numeric_value(row.get_ref(1)?, "weight")?;
        let percent = numeric_value(row.get_ref(2)?, "percent")?.unwrap_or(0.0);
        let category_id = match category_value(row.get_ref(3)?)? {
            Some(id) => id,
            None => {
                debug!(key = %key, "skipping keyword row without table_id");
                continue;
            }
        };

        keywords.push(KeywordWeight {
            key,
            weight,
            percent,
            category_id,
        });
    }
    Ok(keywords)
}

fn numeric_value(value: ValueRef<'_>, column: &str) -> Result<Option<f64>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i as f64)),
        ValueRef::Real(f) => finite_cell(f)
            .map(Some)
            .map_err(|e| KeyclassError::InvalidDictionary(format!("keys.{column}: {e}"))),
        ValueRef::Text(raw) => parse_numeric_cell(&String::from_utf8_lossy(raw))
            .map_err(|e| KeyclassError::InvalidDictionary(format!("keys.{column}: {e}"))),
        ValueRef::Blob(_) => Err(KeyclassError::InvalidDictionary(format!(
            "keys.{column}: unexpected blob value"
        ))),
    }
}

/// `keys.table_id` as a category id. NULL means the row belongs to no category.
fn category_value(value: ValueRef<'_>) -> Result<Option<CategoryId>> {
    let invalid = |shown: String| {
        KeyclassError::InvalidDictionary(format!("keys.table_id: '{shown}' is not an integer id"))
    };
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i)),
        ValueRef::Real(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
        ValueRef::Real(f) => Err(invalid(f.to_string())),
        ValueRef::Text(raw) => {
            let text = String::from_utf8_lossy(raw);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<i64>().map(Some).map_err(|_| invalid(trimmed.to_string()))
        }
        ValueRef::Blob(_) => Err(invalid("<blob>".to_string())),
    }
}

fn missing_table(table: &'static str) -> impl Fn(rusqlite::Error) -> KeyclassError {
    move |e| KeyclassError::InvalidDictionary(format!("cannot read table '{table}': {e}"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use rusqlite::types::Value;

    #[test]
    fn loads_sqlite_tables_in_row_order() {
        let bytes = fixtures::sqlite_bytes(
            &[(2, "Sport"), (1, "Economy")],
            &[("futbol", "", "0.8", 2), ("bank", "3", "1.5", 1)],
        );
        let dictionary = Dictionary::from_bytes(&bytes).unwrap();

        assert_eq!(
            dictionary.categories,
            vec![Category::new(2, "Sport"), Category::new(1, "Economy")]
        );
        assert_eq!(dictionary.keywords[0].weight, None);
        assert_eq!(dictionary.keywords[0].percent, 0.8);
        assert_eq!(dictionary.keywords[1].weight, Some(3.0));
        assert_eq!(dictionary.keywords[1].category_id, 1);
    }

    #[test]
    fn non_numeric_percent_is_rejected() {
        let bytes = fixtures::sqlite_bytes(&[(1, "A")], &[("x", "", "high", 1)]);
        let err = Dictionary::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, KeyclassError::InvalidDictionary(_)), "{err}");
    }

    fn sqlite_with_rows(schema: &str, rows: &[(&str, Value, Value)]) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(schema).unwrap();
        conn.execute_batch(
            "INSERT INTO tables (id, name) VALUES (1, 'Animals'), (2, 'Finance');",
        )
        .unwrap();
        for (key, percent, table_id) in rows {
            conn.execute(
                "INSERT INTO keys (key, weight, percent, table_id) VALUES (?1, NULL, ?2, ?3)",
                rusqlite::params![key, percent, table_id],
            )
            .unwrap();
        }
        drop(conn);
        std::fs::read(&path).unwrap()
    }

    const TEXT_SCHEMA: &str =
        "CREATE TABLE tables (id INTEGER, name TEXT);
         CREATE TABLE keys (key TEXT, weight TEXT, percent TEXT, table_id TEXT);";
    const NUMERIC_SCHEMA: &str =
        "CREATE TABLE tables (id INTEGER, name TEXT);
         CREATE TABLE keys (key TEXT, weight REAL, percent REAL, table_id INTEGER);";

    #[test]
    fn textual_and_numeric_percents_classify_identically() {
        let text_rows = [
            ("cat", Value::Text("0.8".into()), Value::Text("1".into())),
            ("bank", Value::Text("1.5".into()), Value::Text("2".into())),
            ("dog", Value::Text("2".into()), Value::Text("1".into())),
        ];
        let numeric_rows = [
            ("cat", Value::Real(0.8), Value::Integer(1)),
            ("bank", Value::Real(1.5), Value::Integer(2)),
            ("dog", Value::Integer(2), Value::Integer(1)),
        ];
        let textual = Dictionary::from_bytes(&sqlite_with_rows(TEXT_SCHEMA, &text_rows)).unwrap();
        let numeric =
            Dictionary::from_bytes(&sqlite_with_rows(NUMERIC_SCHEMA, &numeric_rows)).unwrap();
        assert_eq!(textual.keywords, numeric.keywords);

        let classifier = KeywordClassifier::new();
        for text in ["Cat and dog", "bank bank cat", "nothing here"] {
            assert_eq!(
                classifier.classify_text(text, &textual),
                classifier.classify_text(text, &numeric),
                "{text}"
            );
        }
        let confidence = classifier.classify_text("cat dog", &numeric).confidence;
        assert!((confidence - 2.8).abs() < 1e-9, "{confidence}");
    }

    #[test]
    fn rows_without_table_id_are_skipped() {
        let rows = [
            ("cat", Value::Text("0.8".into()), Value::Integer(1)),
            ("orphan", Value::Text("0.5".into()), Value::Null),
        ];
        let dictionary = Dictionary::from_bytes(&sqlite_with_rows(NUMERIC_SCHEMA, &rows)).unwrap();
        assert_eq!(dictionary.keywords.len(), 1);
        assert_eq!(dictionary.keywords[0].key, "cat");

        let result = KeywordClassifier::new().classify_text("orphan cat", &dictionary);
        assert_eq!(result.predicted_category, "Animals");
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn non_integer_table_id_is_invalid_dictionary() {
        let rows = [("cat", Value::Text("0.8".into()), Value::Text("animals".into()))];
        let err = Dictionary::from_bytes(&sqlite_with_rows(TEXT_SCHEMA, &rows)).unwrap_err();
        assert!(matches!(err, KeyclassError::InvalidDictionary(_)), "{err}");
        assert!(err.is_client_error());
    }

    #[test]
    fn non_finite_percent_is_rejected() {
        for percent in [Value::Text("NaN".into()), Value::Text("inf".into()), Value::Real(f64::INFINITY)] {
            let rows = [("cat", percent, Value::Integer(1))];
            let err = Dictionary::from_bytes(&sqlite_with_rows(NUMERIC_SCHEMA, &rows)).unwrap_err();
            assert!(matches!(err, KeyclassError::InvalidDictionary(_)), "{err}");
        }
    }

    #[test]
    fn sqlite_without_keys_table_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE tables (id INTEGER, name TEXT);")
            .unwrap();
        drop(conn);

        let err = Dictionary::from_path(&path).unwrap_err();
        assert!(err.to_string().contains("keys"), "{err}");
    }

    #[test]
    fn loads_yaml_layout() {
        let yaml = r#"
categories:
  - { id: 1, name: Sport }
  - { id: 2, name: Economy }
keywords:
  - { key: futbol, percent: 0.9, category_id: 1 }
  - { key: Bank, weight: 2, percent: "1.25", table_id: 2 }
"#;
        let dictionary = Dictionary::from_bytes(yaml.as_bytes()).unwrap();
        assert_eq!(dictionary.categories.len(), 2);
        assert_eq!(dictionary.keywords[1].percent, 1.25);
        assert_eq!(dictionary.category_name(2), Some("Economy"));
    }

    #[test]
    fn loads_json_layout() {
        let json = r#"{"categories":[{"id":1,"name":"A"}],"keywords":[{"key":"cat","weight":"","percent":"0.8","category_id":1}]}"#;
        let dictionary = Dictionary::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(dictionary.keywords[0].percent, 0.8);
    }

    #[test]
    fn binary_garbage_is_invalid() {
        let err = Dictionary::from_bytes(&[0xff, 0xfe, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, KeyclassError::InvalidDictionary(_)));
    }
}
