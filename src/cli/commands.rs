use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docsplit",
    version,
    about = "Syntax-aware, token-bounded document chunking for embedding pipelines",
    after_help = "Settings are read from .docsplit/config.toml in the project root. \
                  Logs go to stderr; set RUST_LOG=debug for per-file chunk counts."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Chunk a single file and print its documents as a JSON array.
    ///
    /// Source code is split on top-level syntax nodes within the token budget.
    /// Plain text (.txt, .rst, ...) and PDF use the overlapping text splitter.
    Chunk {
        /// File to chunk
        path: String,
        /// Language id to parse with (forces the code chunker)
        #[arg(short, long)]
        lang: Option<String>,
        /// Token budget per chunk (overrides the model limit)
        #[arg(short, long, allow_negative_numbers = true)]
        budget: Option<i64>,
        /// Embedding model whose input limit sets the budget
        #[arg(short, long)]
        model: Option<String>,
        /// Slicing policy for oversized nodes: chars or tokens
        #[arg(long)]
        slicer: Option<String>,
    },

    /// Chunk every supported file under a directory, one JSON document per line.
    ///
    /// Respects .gitignore and skips hidden files and common build directories.
    /// Only files whose extension has a known language (built-in or
    /// `languages.custom_mappings`), plain text or PDF are loaded. Unlike
    /// `chunk`, other extensions are skipped as unsupported_extension rather
    /// than parsed with the default language.
    Ingest {
        /// Project root directory (default: current directory)
        #[arg(default_value = ".")]
        path: String,
        /// Print run statistics instead of documents
        #[arg(long)]
        summary: bool,
    },

    /// Write .docsplit/config.toml with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List language ids with a grammar and the default language
    Languages,

    /// Show the token budget for an embedding model
    Budget {
        /// Model name (default: configured model)
        model: Option<String>,
    },
}
