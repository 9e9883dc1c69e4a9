// Inherit lint configuration from lib.rs for consistency
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value
)]

use std::path::Path;

use clap::Parser;
use serde::Serialize;

use docsplit::cli::commands::{Cli, Command};
use docsplit::cli::output;
use docsplit::config::Config;
use docsplit::ingest::grammar;
use docsplit::ingest::Loader;
use docsplit::models::tokens::{known_models, max_tokens_for, DEFAULT_MAX_TOKENS};
use docsplit::pipeline;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries the JSON output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> CmdResult {
    match cli.command {
        Command::Chunk {
            path,
            lang,
            budget,
            model,
            slicer,
        } => cmd_chunk(&path, lang.as_deref(), budget, model, slicer),
        Command::Ingest { path, summary } => cmd_ingest(&path, summary),
        Command::Init { force } => cmd_init(force),
        Command::Languages => cmd_languages(),
        Command::Budget { model } => cmd_budget(model.as_deref()),
    }
}

type CmdResult = Result<(), Box<dyn std::fmt::Display>>;

fn map_err(e: impl std::fmt::Display + 'static) -> Box<dyn std::fmt::Display> {
    Box::new(e.to_string())
}

fn get_config() -> Result<Config, Box<dyn std::fmt::Display>> {
    Config::from_cwd().map_err(map_err)
}

fn cmd_chunk(
    path: &str,
    lang: Option<&str>,
    budget: Option<i64>,
    model: Option<String>,
    slicer: Option<String>,
) -> CmdResult {
    let mut config = get_config()?;
    if let Some(model) = model {
        config.settings.chunking.model = model;
        config.settings.chunking.max_tokens = None;
    }
    if budget.is_some() {
        config.settings.chunking.max_tokens = budget;
    }
    if let Some(slicer) = slicer {
        config.settings.chunking.slicer = slicer;
    }

    let loader = Loader::from_config(&config).map_err(map_err)?;
    let docs = loader
        .load_file(Path::new(path), path, lang)
        .map_err(map_err)?;
    println!("{}", output::format_json(&docs));
    Ok(())
}

fn cmd_ingest(path: &str, summary: bool) -> CmdResult {
    let config = if path == "." {
        get_config()?
    } else {
        Config::new(path)
    };

    let result = pipeline::run_ingest(&config).map_err(map_err)?;
    if summary {
        println!("{}", output::format_json(&result));
    } else if !result.documents.is_empty() {
        println!("{}", output::format_jsonl(&result.documents));
    }
    Ok(())
}

fn cmd_init(force: bool) -> CmdResult {
    #[derive(Serialize)]
    struct InitOutput {
        config_path: String,
        written: bool,
    }

    let config = get_config()?;
    let exists = config.config_path.exists();
    if !exists || force {
        config.save_settings().map_err(map_err)?;
    }
    let output = InitOutput {
        config_path: config.config_path.display().to_string(),
        written: !exists || force,
    };
    println!("{}", output::format_json(&output));
    Ok(())
}

fn cmd_languages() -> CmdResult {
    #[derive(Serialize)]
    struct LanguagesOutput {
        languages: Vec<&'static str>,
        default_language: Option<String>,
    }

    let config = get_config()?;
    let default = config.settings.chunking.default_language;
    let output = LanguagesOutput {
        languages: grammar::supported_languages(),
        default_language: (!default.is_empty()).then_some(default),
    };
    println!("{}", output::format_json(&output));
    Ok(())
}

fn cmd_budget(model: Option<&str>) -> CmdResult {
    #[derive(Serialize)]
    struct BudgetOutput<'a> {
        model: &'a str,
        max_tokens: usize,
        known: bool,
        default_max_tokens: usize,
    }

    let config = get_config()?;
    let model = model.unwrap_or(config.settings.chunking.model.as_str());
    let output = BudgetOutput {
        model,
        max_tokens: max_tokens_for(model),
        known: known_models().contains(&model),
        default_max_tokens: DEFAULT_MAX_TOKENS,
    };
    println!("{}", output::format_json(&output));
    Ok(())
}
