use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

// Import from keyclass-core
use keyclass_core::{
    parse_record_id, ClassificationResult, ClassificationService, Dictionary, DocumentExtractor,
    DocumentInput, KeyclassConfig, KeywordClassifier, UploadedFile,
};

use keyclass_core::extractors::{PdfBackendImpl, PdfExtractor, PdftotextBackend};

// Import CLI utilities
use keyclass_cli::cli::{
    Args, ClassificationCommand, Command, DictionaryCommand, DocumentCommand, RunArgs,
};
use keyclass_cli::{init_tracing, resolve_storage_dir};

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(config_path) => KeyclassConfig::load_from_file(config_path)
            .with_context(|| format!("failed to load config from {config_path}"))?,
        None => KeyclassConfig::default(),
    };
    init_tracing(&config.logging.level);

    if let Err(e) = run(args, config) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: Args, config: KeyclassConfig) -> Result<()> {
    let open = || open_service(&args, &config);

    match &args.command {
        Command::Run(run_args) => run_once(run_args, &config),
        Command::Dictionary(command) => dictionary_command(&open()?, command),
        Command::Document(command) => document_command(&open()?, command),
        Command::Classify {
            document,
            dictionary,
        } => {
            let record =
                open()?.classify(parse_record_id(document)?, parse_record_id(dictionary)?)?;
            print_result_line(&record.result);
            print_json(&record)
        }
        Command::Classification(command) => classification_command(&open()?, command),
    }
}

fn open_service(args: &Args, config: &KeyclassConfig) -> Result<ClassificationService> {
    let storage_dir = resolve_storage_dir(args.storage_dir.as_deref(), config)?;
    debug!(storage_dir = %storage_dir.display(), "opening storage");
    let service = ClassificationService::from_config(config, &storage_dir)
        .with_context(|| format!("failed to open storage at {}", storage_dir.display()))?
        .with_profiling(args.profile);
    Ok(service)
}

fn dictionary_command(service: &ClassificationService, command: &DictionaryCommand) -> Result<()> {
    match command {
        DictionaryCommand::Add { name, file } => {
            let bytes = read_file(file)?;
            let record = service.add_dictionary(name, &file_name(file), &bytes)?;
            eprintln!(
                "✅ Stored dictionary '{}' ({} categories, {} keywords)",
                record.name, record.category_count, record.keyword_count
            );
            print_json(&record)
        }
        DictionaryCommand::List => print_json(&service.list_dictionaries()?),
        DictionaryCommand::Get { id, output } => {
            let (record, bytes) = service.get_dictionary(parse_record_id(id)?)?;
            match output {
                Some(path) => {
                    write_file(path, &bytes)?;
                    eprintln!("💾 Wrote {} to {}", record.file_name, path.display());
                    Ok(())
                }
                None => print_json(&record),
            }
        }
        DictionaryCommand::Delete { id } => {
            service.delete_dictionary(parse_record_id(id)?)?;
            eprintln!("🗑️  Deleted dictionary {id}");
            Ok(())
        }
    }
}

fn document_command(service: &ClassificationService, command: &DocumentCommand) -> Result<()> {
    match command {
        DocumentCommand::Add { name, file, text } => {
            let file = match file {
                Some(path) => Some(UploadedFile {
                    file_name: file_name(path),
                    bytes: read_file(path)?,
                }),
                None => None,
            };
            let input = DocumentInput {
                file,
                text: text.clone(),
            };
            let record = service.add_document(name, input)?;
            eprintln!("✅ Stored document '{}'", record.name);
            print_json(&record)
        }
        DocumentCommand::List => print_json(&service.list_documents()?),
        DocumentCommand::Get { id, output } => {
            let (record, content) = service.get_document(parse_record_id(id)?)?;
            match output {
                Some(path) => {
                    write_file(path, content.as_bytes())?;
                    eprintln!("💾 Wrote {} to {}", record.download_name(), path.display());
                    Ok(())
                }
                None => print_json(&record),
            }
        }
        DocumentCommand::Delete { id } => {
            service.delete_document(parse_record_id(id)?)?;
            eprintln!("🗑️  Deleted document {id}");
            Ok(())
        }
    }
}

fn classification_command(
    service: &ClassificationService,
    command: &ClassificationCommand,
) -> Result<()> {
    match command {
        ClassificationCommand::List => print_json(&service.list_classifications()?),
        ClassificationCommand::Get { id } => {
            print_json(&service.get_classification(parse_record_id(id)?)?)
        }
        ClassificationCommand::Delete { id } => {
            service.delete_classification(parse_record_id(id)?)?;
            eprintln!("🗑️  Deleted classification {id}");
            Ok(())
        }
    }
}

/// Classify straight from files, bypassing storage
fn run_once(args: &RunArgs, config: &KeyclassConfig) -> Result<()> {
    let dictionary = Dictionary::from_path(&args.dictionary)
        .with_context(|| format!("failed to load dictionary {}", args.dictionary.display()))?;
    eprintln!(
        "📋 Loaded dictionary: {} categories, {} keywords",
        dictionary.categories.len(),
        dictionary.keywords.len()
    );

    let text = match (&args.file, &args.text) {
        (Some(path), _) => {
            eprintln!("📄 Processing: {}", path.display());
            let name = file_name(path);
            if name.to_lowercase().ends_with(".txt") {
                std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?
            } else {
                if name.to_lowercase().ends_with(".pdf") {
                    ensure_pdf_backend(config)?;
                }
                let bytes = read_file(path)?;
                DocumentExtractor::from_config(&config.extraction).extract(&name, &bytes)?
            }
        }
        (None, Some(text)) => text.clone(),
        (None, None) => anyhow::bail!("either --file or --text is required"),
    };

    let result = KeywordClassifier::new().classify_text(&text, &dictionary);
    print_result_line(&result);
    print_json(&result)
}

/// Fail early with a pointer at the config key when `pdftotext` cannot run
fn ensure_pdf_backend(config: &KeyclassConfig) -> Result<()> {
    let pdf = PdfExtractor::new(PdfBackendImpl::Pdftotext(PdftotextBackend::new(
        &config.extraction.pdftotext_path,
    )));
    if !pdf.is_healthy() {
        anyhow::bail!(
            "PDF backend '{}' is not available at '{}' (install poppler-utils or set extraction.pdftotext_path)",
            pdf.backend_name(),
            config.extraction.pdftotext_path
        );
    }
    Ok(())
}

fn print_result_line(result: &ClassificationResult) {
    if result.is_unknown() {
        eprintln!("🤷 No keywords matched");
    } else {
        eprintln!(
            "🏷️  {} (score {})",
            result.predicted_category, result.confidence
        );
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
