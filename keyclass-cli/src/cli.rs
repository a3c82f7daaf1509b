use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "keyclass")]
#[command(about = "Classify documents against weighted keyword dictionaries")]
pub struct Args {
    /// Path to config file (YAML format)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory holding uploaded files and records
    /// If not specified, uses storage.root_dir from the config or ~/.local/share/keyclass
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Log timings for each classification step
    #[arg(long, global = true)]
    pub profile: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage keyword dictionaries
    #[command(subcommand)]
    Dictionary(DictionaryCommand),

    /// Manage documents
    #[command(subcommand)]
    Document(DocumentCommand),

    /// Classify a stored document against a stored dictionary
    Classify {
        #[arg(long)]
        document: String,
        #[arg(long)]
        dictionary: String,
    },

    /// Inspect or delete stored classifications
    #[command(subcommand)]
    Classification(ClassificationCommand),

    /// Classify a file or text against a dictionary file without storing anything
    Run(RunArgs),
}

#[derive(Debug, Subcommand)]
pub enum DictionaryCommand {
    /// Upload a dictionary file (SQLite, YAML or JSON)
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        file: PathBuf,
    },
    List,
    /// Show a dictionary record, or write the stored file with --output
    Get {
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// Upload a document file or raw text
    // --file and --text are validated by the service so both error paths stay identical
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        text: Option<String>,
    },
    List,
    /// Show a document, or write its stored content with --output
    Get {
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ClassificationCommand {
    List,
    Get { id: String },
    Delete { id: String },
}

#[derive(Debug, ClapArgs)]
pub struct RunArgs {
    /// Dictionary file (SQLite, YAML or JSON)
    #[arg(long)]
    pub dictionary: PathBuf,

    /// Document to classify (.pdf, .docx or plain .txt)
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    pub file: Option<PathBuf>,

    /// Raw text to classify
    #[arg(long)]
    pub text: Option<String>,
}
