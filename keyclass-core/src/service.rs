use crate::cache::{versions, ClassificationKey};
use crate::classifier::KeywordClassifier;
use crate::config::{ExtractionConfig, KeyclassConfig};
use crate::dictionary::Dictionary;
use crate::error::{KeyclassError, Result};
use crate::extractors::DocumentExtractor;
use crate::storage::{calculate_content_hash, BlobStorage, FileStorage, Namespace};
use crate::tokenizer::tokenize;
use crate::types::*;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Simple profiler that collects timings for classification steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        info!(step = step_name, elapsed_ms = elapsed.as_millis() as u64, "step finished");

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            info!(
                step = step.as_str(),
                elapsed_ms = duration.as_millis() as u64,
                share_pct = (percentage * 10.0).round() / 10.0,
                "profile"
            );
        }
        info!(total_ms = total.as_millis() as u64, "profile total");
    }
}

/// An uploaded file: original name plus raw bytes
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Document upload payload. Exactly one of `file` or non-empty `text` is accepted.
#[derive(Debug, Clone, Default)]
pub struct DocumentInput {
    pub file: Option<UploadedFile>,
    pub text: Option<String>,
}

impl DocumentInput {
    pub fn file(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file: Some(UploadedFile {
                file_name: file_name.into(),
                bytes,
            }),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            file: None,
            text: Some(text.into()),
        }
    }
}

/// Parse a record id given on the command line or in a request
pub fn parse_record_id(raw: &str) -> Result<RecordId> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| KeyclassError::InvalidInput(format!("'{raw}' is not a valid id")))
}

/// Dictionaries, documents and classifications over injected storage and extraction
pub struct ClassificationService {
    storage: Box<dyn BlobStorage>,
    extractor: DocumentExtractor,
    extraction_config: ExtractionConfig,
    classifier: KeywordClassifier,
    profiling: bool,
}

impl ClassificationService {
    /// Create ClassificationService with full dependency injection
    pub fn new_with_dependencies(
        storage: Box<dyn BlobStorage>,
        extractor: DocumentExtractor,
    ) -> Self {
        Self {
            storage,
            extractor,
            extraction_config: ExtractionConfig::default(),
            classifier: KeywordClassifier::new(),
            profiling: false,
        }
    }

    /// Convenience constructor for CLI usage: file storage under `storage_root`
    pub fn from_config(config: &KeyclassConfig, storage_root: &Path) -> Result<Self> {
        let storage = Box::new(FileStorage::new(storage_root)?);
        let extractor = DocumentExtractor::from_config(&config.extraction);
        Ok(Self::new_with_dependencies(storage, extractor)
            .with_extraction_config(config.extraction.clone()))
    }

    pub fn with_extraction_config(mut self, extraction_config: ExtractionConfig) -> Self {
        self.extraction_config = extraction_config;
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    // ===== DICTIONARIES =====

    /// Store a dictionary file. The bytes must load as a dictionary.
    pub fn add_dictionary(
        &self,
        name: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DictionaryRecord> {
        require_name(name)?;
        if file_name.trim().is_empty() || bytes.is_empty() {
            return Err(KeyclassError::InvalidInput("No file provided".to_string()));
        }

        let dictionary = Dictionary::from_bytes(bytes)?;
        let record = DictionaryRecord {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            file_name: file_name.to_string(),
            content_hash: calculate_content_hash(bytes),
            category_count: dictionary.categories.len(),
            keyword_count: dictionary.keywords.len(),
            created_at: Utc::now(),
        };

        let id = record.id.to_string();
        self.storage.put(Namespace::DictionaryFiles, &id, bytes)?;
        self.put_record(Namespace::DictionaryRecords, &id, &record)?;

        info!(
            dictionary_id = %record.id,
            name = %record.name,
            categories = record.category_count,
            keywords = record.keyword_count,
            "stored dictionary"
        );
        Ok(record)
    }

    pub fn list_dictionaries(&self) -> Result<Vec<DictionaryRecord>> {
        let mut records: Vec<DictionaryRecord> = self.list_records(Namespace::DictionaryRecords)?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    pub fn dictionary_record(&self, id: RecordId) -> Result<DictionaryRecord> {
        self.get_record(Namespace::DictionaryRecords, &id.to_string())?
            .ok_or_else(|| KeyclassError::not_found("dictionary", id))
    }

    /// Record plus the file exactly as uploaded
    pub fn get_dictionary(&self, id: RecordId) -> Result<(DictionaryRecord, Vec<u8>)> {
        let record = self.dictionary_record(id)?;
        let bytes = self
            .storage
            .get(Namespace::DictionaryFiles, &id.to_string())?
            .ok_or_else(|| KeyclassError::not_found("dictionary file", id))?;
        Ok((record, bytes))
    }

    pub fn load_dictionary(&self, id: RecordId) -> Result<Dictionary> {
        let (_, bytes) = self.get_dictionary(id)?;
        Dictionary::from_bytes(&bytes)
    }

    /// Deletes the dictionary and every classification computed with it
    pub fn delete_dictionary(&self, id: RecordId) -> Result<()> {
        self.dictionary_record(id)?;
        let key = id.to_string();
        self.storage.delete(Namespace::DictionaryFiles, &key)?;
        self.storage.delete(Namespace::DictionaryRecords, &key)?;
        let removed = self.delete_classifications_where(|c| c.dictionary_id == id)?;
        info!(dictionary_id = %id, classifications_removed = removed, "deleted dictionary");
        Ok(())
    }

    // ===== DOCUMENTS =====

    pub fn add_document(&self, name: &str, input: DocumentInput) -> Result<DocumentRecord> {
        require_name(name)?;
        let text = input.text.filter(|t| !t.is_empty());

        let (source, bytes) = match (input.file, text) {
            (None, None) => {
                return Err(KeyclassError::InvalidInput(
                    "Either file or text must be provided".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(KeyclassError::InvalidInput(
                    "Provide either file or text, not both".to_string(),
                ))
            }
            (Some(file), None) => {
                if !self.extraction_config.accepts_upload(&file.file_name) {
                    return Err(KeyclassError::InvalidInput(format!(
                        "File must be one of: {}",
                        self.extraction_config.upload_extensions.join(", ").to_uppercase()
                    )));
                }
                let source = DocumentSource::File {
                    file_name: file.file_name,
                    content_hash: calculate_content_hash(&file.bytes),
                };
                (source, file.bytes)
            }
            (None, Some(text)) => (DocumentSource::Text, text.into_bytes()),
        };

        let record = DocumentRecord {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            source,
            created_at: Utc::now(),
        };

        let id = record.id.to_string();
        self.storage.put(Namespace::DocumentFiles, &id, &bytes)?;
        self.put_record(Namespace::DocumentRecords, &id, &record)?;

        info!(document_id = %record.id, name = %record.name, bytes = bytes.len(), "stored document");
        Ok(record)
    }

    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let mut records: Vec<DocumentRecord> = self.list_records(Namespace::DocumentRecords)?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    pub fn document_record(&self, id: RecordId) -> Result<DocumentRecord> {
        self.get_record(Namespace::DocumentRecords, &id.to_string())?
            .ok_or_else(|| KeyclassError::not_found("document", id))
    }

    pub fn get_document(&self, id: RecordId) -> Result<(DocumentRecord, DocumentContent)> {
        let record = self.document_record(id)?;
        let bytes = self
            .storage
            .get(Namespace::DocumentFiles, &id.to_string())?
            .ok_or_else(|| KeyclassError::not_found("document content", id))?;

        let content = match &record.source {
            DocumentSource::File { file_name, .. } => DocumentContent::File {
                file_name: file_name.clone(),
                bytes,
            },
            DocumentSource::Text => DocumentContent::Text(
                String::from_utf8(bytes)
                    .map_err(|e| KeyclassError::InvalidInput(format!("stored text is not UTF-8: {e}")))?,
            ),
        };
        Ok((record, content))
    }

    /// Plain text of a stored document, extracting it from the file if needed
    pub fn document_text(&self, id: RecordId) -> Result<String> {
        match self.get_document(id)? {
            (_, DocumentContent::Text(text)) => Ok(text),
            (_, DocumentContent::File { file_name, bytes }) => {
                self.extractor.extract(&file_name, &bytes)
            }
        }
    }

    /// Deletes the document and every classification computed for it
    pub fn delete_document(&self, id: RecordId) -> Result<()> {
        self.document_record(id)?;
        let key = id.to_string();
        self.storage.delete(Namespace::DocumentFiles, &key)?;
        self.storage.delete(Namespace::DocumentRecords, &key)?;
        let removed = self.delete_classifications_where(|c| c.document_id == id)?;
        info!(document_id = %id, classifications_removed = removed, "deleted document");
        Ok(())
    }

    // ===== CLASSIFICATIONS =====

    /// Classify a stored document against a stored dictionary.
    ///
    /// A pair that was classified before returns the stored record unchanged.
    pub fn classify(
        &self,
        document_id: RecordId,
        dictionary_id: RecordId,
    ) -> Result<ClassificationRecord> {
        let start_time = Instant::now();
        let key = ClassificationKey::new(document_id, dictionary_id);

        if let Some(existing) = self.find_classification(&key)? {
            info!(
                classification_id = %existing.id,
                %document_id,
                %dictionary_id,
                "found stored classification for pair"
            );
            return Ok(existing);
        }

        let mut profiler = StepProfiler::new(self.profiling);

        self.document_record(document_id)?;
        self.dictionary_record(dictionary_id)?;

        let dictionary =
            profiler.time_step("1. Dictionary Load", || self.load_dictionary(dictionary_id))?;
        let text = profiler.time_step("2. Text Extraction", || self.document_text(document_id))?;
        let tokens = profiler.time_step("3. Tokenization", || tokenize(&text));
        let result = profiler.time_step("4. Scoring", || {
            self.classifier
                .classify(&tokens, &dictionary.categories, &dictionary.keywords)
        });

        let record = ClassificationRecord {
            id: Uuid::new_v4(),
            document_id,
            dictionary_id,
            result,
            created_at: Utc::now(),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
            classifier_version: versions::CLASSIFIER_VERSION.to_string(),
        };

        profiler.time_step("5. Storage", || {
            self.put_record(
                Namespace::ClassificationRecords,
                &record.id.to_string(),
                &record,
            )?;
            self.storage.put(
                Namespace::ClassificationIndex,
                &key.to_cache_hash(),
                record.id.to_string().as_bytes(),
            )
        })?;

        profiler.log_summary();
        info!(
            classification_id = %record.id,
            predicted_category = %record.result.predicted_category,
            confidence = record.result.confidence,
            tokens = tokens.len(),
            elapsed_ms = record.processing_time_ms,
            "classified document"
        );
        Ok(record)
    }

    pub fn list_classifications(&self) -> Result<Vec<ClassificationRecord>> {
        let mut records: Vec<ClassificationRecord> =
            self.list_records(Namespace::ClassificationRecords)?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    pub fn get_classification(&self, id: RecordId) -> Result<ClassificationRecord> {
        self.get_record(Namespace::ClassificationRecords, &id.to_string())?
            .ok_or_else(|| KeyclassError::not_found("classification", id))
    }

    pub fn delete_classification(&self, id: RecordId) -> Result<()> {
        let record = self.get_classification(id)?;
        self.remove_classification(&record)
    }

    fn find_classification(&self, key: &ClassificationKey) -> Result<Option<ClassificationRecord>> {
        let pointer = match self
            .storage
            .get(Namespace::ClassificationIndex, &key.to_cache_hash())?
        {
            Some(pointer) => pointer,
            None => return Ok(None),
        };

        let id = String::from_utf8_lossy(&pointer).into_owned();
        match self.get_record(Namespace::ClassificationRecords, &id)? {
            Some(record) => Ok(Some(record)),
            None => {
                warn!(classification_id = %id, "classification index points at a missing record");
                Ok(None)
            }
        }
    }

    fn remove_classification(&self, record: &ClassificationRecord) -> Result<()> {
        let key = ClassificationKey::new(record.document_id, record.dictionary_id);
        self.storage
            .delete(Namespace::ClassificationRecords, &record.id.to_string())?;
        self.storage
            .delete(Namespace::ClassificationIndex, &key.to_cache_hash())?;
        Ok(())
    }

    fn delete_classifications_where<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&ClassificationRecord) -> bool,
    {
        let mut removed = 0;
        for record in self.list_classifications()? {
            if predicate(&record) {
                self.remove_classification(&record)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ===== RECORD HELPERS =====

    fn put_record<T: Serialize>(&self, namespace: Namespace, id: &str, record: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)?;
        self.storage.put(namespace, id, &json)
    }

    fn get_record<T: DeserializeOwned>(&self, namespace: Namespace, id: &str) -> Result<Option<T>> {
        match self.storage.get(namespace, id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_records<T: DeserializeOwned>(&self, namespace: Namespace) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for id in self.storage.list(namespace)? {
            if let Some(record) = self.get_record(namespace, &id)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(KeyclassError::InvalidInput("Name must not be empty".to_string()))
    } else {
        Ok(())
    }
}
