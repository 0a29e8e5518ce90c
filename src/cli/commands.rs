//! Subcommand handlers

use super::args::{Args, Commands, Verbosity};
use crate::chunking::{Chunker, ChunkerConfig, HeuristicCounter, TokenCounter};
use crate::config::Config;
use crate::conversation::Session;
use crate::embedding::{EmbeddingGateway, GatewayConfig};
use crate::index::{KnowledgeBase, KnowledgeHandle};
use crate::pipeline::{Assistant, Ingestor, Input, Outcome, Reply};
use crate::providers;
use crate::repl::ReplSession;
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Dispatch the parsed command line
pub async fn run(args: &Args, config: Config) -> Result<()> {
    let verbosity = args.verbosity();

    match &args.command {
        Commands::Ingest {
            document,
            output,
            heuristic_tokens,
        } => ingest(&config, verbosity, document, output.clone(), *heuristic_tokens).await,
        Commands::Ask {
            audio,
            speak,
            knowledge,
            ..
        } => {
            let input = match (args.question(), audio) {
                (Some(question), _) => Input::Text(question),
                (None, Some(path)) => Input::Audio(
                    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                (None, None) => anyhow::bail!("nothing to ask"),
            };
            ask(&config, verbosity, input, speak.as_deref(), knowledge.clone()).await
        }
        Commands::Chat { knowledge } => chat(&config, verbosity, knowledge.clone()).await,
        Commands::Inspect {
            knowledge,
            passages,
        } => inspect(&config, knowledge.clone(), *passages),
        Commands::Config { .. } => show_config(&config),
    }
}

async fn ingest(
    config: &Config,
    verbosity: Verbosity,
    document: &Path,
    output: Option<PathBuf>,
    heuristic_tokens: bool,
) -> Result<()> {
    let counter: Arc<dyn TokenCounter> = if heuristic_tokens {
        Arc::new(HeuristicCounter::new())
    } else {
        Chunker::counter_from_config(&config.chunking)
            .context("Failed to load tokenizer (try --heuristic-tokens offline)")?
    };
    let chunker = Chunker::new(ChunkerConfig::from(&config.chunking), counter)?;

    let embedder = providers::build_embedder(&config.embedding)?;
    let mut gateway = EmbeddingGateway::new(embedder, GatewayConfig::from(&config.embedding));

    let spinner = if verbosity.show_progress() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Ingesting {}", document.display()));

        let progress = pb.clone();
        gateway = gateway.with_progress(Arc::new(move |done, total| {
            progress.set_message(format!("Embedding batch {}/{}", done, total));
        }));
        Some(pb)
    } else {
        None
    };

    let output = output.unwrap_or_else(|| config.knowledge_file());
    let ingestor = Ingestor::new(chunker, gateway, KnowledgeHandle::new(), output);
    let result = ingestor.run(document).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    println!(
        "{} {} → {}",
        "✓".green(),
        report.source.display(),
        report.output.display()
    );
    println!(
        "  {} passages indexed (dim {}) in {:.1}s",
        report.indexed,
        report.dimension,
        report.elapsed.as_secs_f64()
    );
    if report.failed_batches > 0 {
        println!(
            "  {}",
            format!(
                "{} of {} passages dropped after {} failed embedding batches",
                report.passages - report.indexed,
                report.passages,
                report.failed_batches
            )
            .yellow()
        );
    }
    Ok(())
}

/// Load the knowledge base and wire an assistant around it.
///
/// A file that fails validation leaves the handle empty, so queries come back
/// unavailable until a successful `/reload`.
fn assistant(config: &Config, knowledge: Option<PathBuf>) -> Result<Assistant> {
    let path = knowledge.unwrap_or_else(|| config.knowledge_file());
    let handle = KnowledgeHandle::new();
    if path.exists() {
        if let Err(e) = handle.load_from(&path) {
            tracing::error!(
                "knowledge base {} rejected, serving without it: {}",
                path.display(),
                e
            );
        }
    } else {
        tracing::warn!("no knowledge base at {}, run `docbuddy ingest` first", path.display());
    }

    Ok(Assistant::from_config(config, handle)?)
}

async fn ask(
    config: &Config,
    verbosity: Verbosity,
    input: Input,
    speak: Option<&Path>,
    knowledge: Option<PathBuf>,
) -> Result<()> {
    let assistant = assistant(config, knowledge)?;
    let mut session = Session::new(config.conversation.history_turns);

    let reply = assistant.answer(&mut session, input).await;
    print_reply(&reply, verbosity);

    if let (Some(path), Some(audio)) = (speak, &reply.audio) {
        std::fs::write(path, audio).with_context(|| format!("Failed to write {}", path.display()))?;
        if verbosity.show_progress() {
            println!("{}", format!("Audio saved to {}", path.display()).dimmed());
        }
    } else if speak.is_some() {
        eprintln!("{}", "No audio produced (is [speech] enabled?)".yellow());
    }

    if matches!(reply.outcome, Outcome::Failed | Outcome::Unavailable) {
        std::process::exit(1);
    }
    Ok(())
}

async fn chat(config: &Config, verbosity: Verbosity, knowledge: Option<PathBuf>) -> Result<()> {
    let knowledge_path = knowledge.clone().unwrap_or_else(|| config.knowledge_file());
    let assistant = assistant(config, knowledge)?;
    let mut repl = ReplSession::new(config, assistant, knowledge_path, verbosity)?;
    repl.run().await
}

fn inspect(config: &Config, knowledge: Option<PathBuf>, passages: Option<usize>) -> Result<()> {
    let path = knowledge.unwrap_or_else(|| config.knowledge_file());
    let kb = KnowledgeBase::load(&path)
        .with_context(|| format!("Failed to load knowledge base {}", path.display()))?;

    println!("{}", "Knowledge base".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    println!("  {:<12} {}", "File:".bold(), path.display());
    println!("  {:<12} {}", "Source:".bold(), kb.source().unwrap_or("-"));
    println!("  {:<12} {}", "Created:".bold(), kb.created_at().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  {:<12} {}", "Passages:".bold(), kb.len());
    println!("  {:<12} {}", "Dimension:".bold(), kb.dimension());
    println!("  {:<12} {}", "Checksum:".bold(), kb.checksum());

    if let Some(n) = passages {
        println!();
        for passage in kb.passages().iter().take(n) {
            let heading = passage
                .source_span
                .as_ref()
                .and_then(|s| s.heading.as_deref())
                .unwrap_or("-");
            println!("{} {}", format!("[{}]", passage.id).green(), heading.dimmed());
            println!("{}\n", preview(&passage.text, 240));
        }
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(&redacted(config))?;
    println!("{}", rendered);
    Ok(())
}

/// Write a default configuration file
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save(path)?;
    println!("{} wrote {}", "✓".green(), path.display());
    Ok(())
}

/// Copy of the config with secrets masked
fn redacted(config: &Config) -> Config {
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("********".to_string());
        }
    };
    let mut shown = config.clone();
    mask(&mut shown.embedding.provider.api_key);
    mask(&mut shown.generation.provider.api_key);
    mask(&mut shown.language.translator_key);
    mask(&mut shown.speech.key);
    shown
}

pub fn print_reply(reply: &Reply, verbosity: Verbosity) {
    let text = match reply.outcome {
        Outcome::Answered => reply.text.normal(),
        Outcome::Refused => reply.text.yellow(),
        Outcome::Unavailable | Outcome::Failed => reply.text.red(),
    };
    println!("{}", text);

    if verbosity.show_trail() {
        let trail: Vec<String> = reply.trail.iter().map(|s| format!("{:?}", s)).collect();
        println!(
            "{}",
            format!("[{:?} in {}] {}", reply.outcome, reply.language, trail.join(" → ")).dimmed()
        );
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
