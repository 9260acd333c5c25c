use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing::debug;

use codebrief_codelens::cache::EmbeddingCache;
use codebrief_codelens::corpus::{CorpusBuilder, CorpusIndex};
use codebrief_codelens::embedding::OpenAiEmbeddings;
use codebrief_codelens::provider::EmbeddingProvider;
use codebrief_codelens::retrieve::RelevanceRetriever;
use codebrief_core::{BriefConfig, BriefError, OutputFormat, RelevantContext};
use codebrief_summary::llm::ChatClient;
use codebrief_summary::pipeline::{collect_summaries, Summarizer};
use codebrief_summary::prompt::format_context;

#[derive(Parser)]
#[command(
    name = "codebrief",
    version,
    about = "Summarize codebases with LLMs, grounded in semantically related code",
    long_about = "codebrief embeds every source file in a project, finds the code sections\n\
                   most related to each file, and asks an LLM for a summary that takes that\n\
                   context into account.\n\n\
                   Examples:\n  \
                     codebrief context ./src ./src/app.py     Show code related to app.py\n  \
                     codebrief summarize ./src --out briefs   Summarize every file\n  \
                     codebrief overview briefs                Write a project overview\n  \
                     codebrief init                           Create .codebrief.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .codebrief.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable output (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (info-level logs)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log filter, e.g. `debug` or `codebrief_codelens=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// When to use colors in log output
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Show the code sections most related to one file
    #[command(long_about = "Show the code sections most related to one file.\n\n\
        Embeds every .py, .ts and .html file under the folder, splits the other files\n\
        into syntax-aware sections, and ranks those sections by similarity to the file.\n\n\
        Examples:\n  codebrief context ./src ./src/db.py\n  codebrief context ./src ./src/db.py --top-n 10 --threshold 0.5")]
    Context {
        /// Project folder to index
        folder: PathBuf,

        /// File to find related code for (must be inside the folder)
        file: PathBuf,

        /// Minimum similarity, exclusive (default from config: 0.625)
        #[arg(long)]
        threshold: Option<f64>,

        /// Maximum sections to return (default from config: 5)
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Summarize every file in a folder
    #[command(long_about = "Summarize every file in a folder.\n\n\
        Writes one <relative path>.summary.txt per source file into the output\n\
        directory, mirroring the folder layout.\n\n\
        Examples:\n  codebrief summarize ./src --out briefs")]
    Summarize {
        /// Project folder to summarize
        folder: PathBuf,

        /// Directory that receives the summaries
        #[arg(long)]
        out: PathBuf,
    },
    /// Produce a project overview from existing summaries
    #[command(long_about = "Produce a project overview from existing summaries.\n\n\
        Reads every *.summary.txt under the directory. With --questions, prints the\n\
        questions the model would like answered; pass the answers back with --answers.\n\n\
        Examples:\n  codebrief overview briefs --questions\n  codebrief overview briefs --answers answers.txt")]
    Overview {
        /// Directory containing *.summary.txt files
        summaries: PathBuf,

        /// File with answers to earlier questions
        #[arg(long, conflicts_with = "questions")]
        answers: Option<PathBuf>,

        /// Print clarifying questions instead of the overview
        #[arg(long)]
        questions: bool,
    },
    /// Create a default .codebrief.toml in the current directory
    Init,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

const DEFAULT_CONFIG: &str = r#"# codebrief configuration

[embedding]
# Any OpenAI-compatible /embeddings endpoint
# base_url = "https://api.openai.com/v1"
# model = "text-embedding-3-small"
# api_key = "..."            # falls back to OPENAI_API_KEY
# cache_capacity = 10000     # section embeddings kept in memory
# timeout_secs = 60

[llm]
# Any OpenAI-compatible /chat/completions endpoint
# base_url = "https://api.openai.com/v1"
# model = "gpt-4o"
# temperature = 0.5          # file summaries
# project_temperature = 0.65 # questions and overview
# timeout_secs = 120

[retrieval]
# threshold = 0.625          # sections must score strictly above this
# top_n = 5
# concurrency = 4            # files scanned at once
# emission = "all"           # "all" or "leaf"

[corpus]
# on_unreadable = "fail"     # "fail" or "skip"
# respect_gitignore = false  # true skips hidden and ignored files
"#;

fn load_config(path: Option<&Path>) -> Result<BriefConfig, BriefError> {
    match path {
        Some(path) => BriefConfig::from_file(path),
        None => {
            let default_path = Path::new(".codebrief.toml");
            if default_path.exists() {
                BriefConfig::from_file(default_path)
            } else {
                Ok(BriefConfig::default())
            }
        }
    }
}

fn embedding_provider(config: &BriefConfig) -> Result<EmbeddingProvider, BriefError> {
    let backend = OpenAiEmbeddings::with_config(&config.embedding)?;
    let cache = EmbeddingCache::with_capacity(config.embedding.cache_capacity)?;
    Ok(EmbeddingProvider::new(Arc::new(backend), Arc::new(cache)))
}

fn summarizer(config: &BriefConfig) -> Result<Summarizer, BriefError> {
    let provider = embedding_provider(config)?;
    let chat = ChatClient::new(&config.llm)?;
    Ok(Summarizer::new(
        Arc::new(chat),
        CorpusBuilder::new(provider.clone(), config.corpus.clone()),
        RelevanceRetriever::new(provider, config.retrieval.clone()),
    )
    .with_temperatures(config.llm.temperature, config.llm.project_temperature))
}

/// Locate `file` among the corpus paths, accepting it either as given or
/// relative to `folder`.
fn find_in_corpus(corpus: &CorpusIndex, folder: &Path, file: &Path) -> Option<usize> {
    let target = file
        .canonicalize()
        .or_else(|_| folder.join(file).canonicalize())
        .ok()?;
    corpus
        .paths()
        .iter()
        .position(|p| p.canonicalize().is_ok_and(|p| p == target))
}

fn print_contexts(file: &Path, contexts: &[RelevantContext], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(contexts).into_diagnostic()?;
            println!("{json}");
        }
        OutputFormat::Markdown => {
            println!("# Related code for `{}`\n", file.display());
            if contexts.is_empty() {
                println!("_No related sections found._");
            }
            for ctx in contexts {
                println!("## {} ({:.2})\n", ctx.file, ctx.similarity);
                println!("```\n{}\n```\n", ctx.section);
            }
        }
        OutputFormat::Text => {
            if contexts.is_empty() {
                println!("No related sections found for {}", file.display());
            } else {
                println!("{}", format_context(contexts));
            }
        }
    }
    Ok(())
}

fn print_text(title: &str, key: &str, text: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut object = serde_json::Map::new();
            object.insert(key.to_string(), serde_json::Value::from(text));
            let json = serde_json::to_string_pretty(&object).into_diagnostic()?;
            println!("{json}");
        }
        OutputFormat::Markdown => println!("# {title}\n\n{text}"),
        OutputFormat::Text => println!("{text}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let no_color = match cli.color {
        ColorChoice::Always => false,
        ColorChoice::Never => true,
        ColorChoice::Auto => !std::io::stderr().is_terminal(),
    };
    let level = cli
        .log_level
        .as_deref()
        .or(if cli.verbose { Some("info") } else { None });
    codebrief_core::logging::init_logging(level, no_color)?;

    let config = load_config(cli.config.as_deref())?;
    debug!(format = %cli.format, "configuration loaded");

    match cli.command {
        Command::Context {
            folder,
            file,
            threshold,
            top_n,
        } => {
            let threshold = threshold.unwrap_or(config.retrieval.threshold);
            if !(-1.0..=1.0).contains(&threshold) {
                miette::bail!("--threshold must be within [-1, 1], got {threshold}");
            }
            let top_n = top_n.unwrap_or(config.retrieval.top_n);

            let provider = embedding_provider(&config)?;
            let corpus = CorpusBuilder::new(provider.clone(), config.corpus.clone())
                .build(&folder)
                .await?;
            let Some(index) = find_in_corpus(&corpus, &folder, &file) else {
                miette::bail!(
                    "{} is not an indexed file under {}",
                    file.display(),
                    folder.display()
                );
            };

            let retriever = RelevanceRetriever::new(provider, config.retrieval.clone());
            let contexts = retriever
                .relevant_context_with(&corpus, index, threshold, top_n)
                .await?;
            print_contexts(&file, &contexts, cli.format)?;

            if cli.verbose {
                let stats = retriever.provider().cache_stats();
                eprintln!(
                    "Cache: {} entries, {:.0}% hit rate",
                    stats.len,
                    stats.hit_rate() * 100.0
                );
            }
        }
        Command::Summarize { folder, out } => {
            let report = summarizer(&config)?.process_folder(&folder, &out).await?;
            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
                    println!("{json}");
                }
                OutputFormat::Markdown => {
                    println!("# Summaries\n");
                    for file in &report.files {
                        println!("- `{}` -> `{}`", file.source.display(), file.output.display());
                    }
                }
                OutputFormat::Text => {
                    for file in &report.files {
                        println!("{}", file.output.display());
                    }
                    println!(
                        "\nWrote {} summaries to {}",
                        report.files.len(),
                        out.display()
                    );
                }
            }
        }
        Command::Overview {
            summaries,
            answers,
            questions,
        } => {
            let combined = collect_summaries(&summaries)?;
            if combined.is_empty() {
                miette::bail!("no *.summary.txt files under {}", summaries.display());
            }
            let summarizer = summarizer(&config)?;

            if questions {
                let text = summarizer.ask_questions(&combined).await?;
                print_text("Questions", "questions", &text, cli.format)?;
            } else {
                let answers = match answers {
                    Some(path) => Some(std::fs::read_to_string(&path).into_diagnostic()?),
                    None => None,
                };
                let text = summarizer
                    .summarize_project(&combined, answers.as_deref())
                    .await?;
                print_text("Project overview", "overview", &text, cli.format)?;
            }
        }
        Command::Init => {
            let path = Path::new(".codebrief.toml");
            if path.exists() {
                miette::bail!(".codebrief.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .codebrief.toml with default configuration");
        }
    }

    Ok(())
}
