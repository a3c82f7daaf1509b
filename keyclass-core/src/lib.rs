// Keyclass Core Library
//
// Rule-based document classification against weighted keyword dictionaries.
// The tokenizer and classifier are pure; storage and text extraction are
// injected into the service that wraps them.

pub mod types;
pub mod error;
pub mod tokenizer;
pub mod classifier;
pub mod dictionary;
pub mod extractors;
pub mod storage;
pub mod cache;
pub mod config;
pub mod service;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{KeyclassError, Result};
pub use tokenizer::tokenize;
pub use classifier::{KeywordClassifier, KeywordIndex};
pub use dictionary::Dictionary;
pub use extractors::{DocumentExtractor, TextExtractor};
pub use storage::{BlobStorage, FileStorage, MemoryStorage, Namespace};
pub use config::KeyclassConfig;
pub use service::{parse_record_id, ClassificationService, DocumentInput, UploadedFile};
