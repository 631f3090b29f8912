use anyhow::{bail, Result};
use chat_core::knowledge::load_knowledge;
use chat_core::persist::{load_snapshot, save_snapshot, IndexPaths};
use chat_core::{ChatData, Conversation, DialogGraph, Matcher, DEFAULT_THRESHOLD};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "chat-indexer")]
#[command(about = "Build, inspect and query the chat fallback index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index snapshot from knowledge JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output snapshot directory
        #[arg(long)]
        output: PathBuf,
    },
    /// Print snapshot statistics and the strongest terms per document
    Stats {
        #[arg(long)]
        index: PathBuf,
        /// Terms to show per document
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Run one free-text query
    Query {
        /// Snapshot directory
        #[arg(long, conflicts_with = "input")]
        index: Option<PathBuf>,
        /// Knowledge file or directory, indexed on the fly
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
        /// Also print every document's score
        #[arg(long, default_value_t = false)]
        scores: bool,
        text: String,
    },
    /// Walk the scripted dialog interactively on stdin/stdout
    Walk {
        /// Chat data JSON
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build(&input, &output),
        Commands::Stats { index, top } => stats(&index, top),
        Commands::Query { index, input, threshold, scores, text } => {
            let matcher = open_matcher(index, input)?.with_threshold(threshold);
            query(&matcher, &text, scores)
        }
        Commands::Walk { data, threshold } => walk(&data, threshold),
    }
}

fn build(input: &Path, output: &Path) -> Result<()> {
    let entries = load_knowledge(input)?;
    let matcher = Matcher::new(entries);
    let meta = save_snapshot(&IndexPaths::new(output), matcher.entries(), matcher.index())?;
    tracing::info!(output = %output.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index build complete");
    Ok(())
}

fn open_matcher(index: Option<PathBuf>, input: Option<PathBuf>) -> Result<Matcher> {
    match (index, input) {
        (Some(dir), _) => {
            let (entries, index, _meta) = load_snapshot(&IndexPaths::new(dir))?;
            Matcher::from_parts(entries, index)
        }
        (None, Some(path)) => Ok(Matcher::new(load_knowledge(&path)?)),
        (None, None) => bail!("either --index or --input is required"),
    }
}

fn stats(dir: &Path, top: usize) -> Result<()> {
    let (entries, index, meta) = load_snapshot(&IndexPaths::new(dir))?;
    println!("documents: {}", meta.num_docs);
    println!("terms:     {}", meta.num_terms);
    println!("created:   {}", meta.created_at);
    for (doc, entry) in entries.iter().enumerate() {
        let terms: Vec<String> = index
            .document_terms(doc as u32)
            .into_iter()
            .take(top)
            .map(|(t, w)| format!("{t}={w:.3}"))
            .collect();
        let label = entry.id.clone().unwrap_or_else(|| format!("#{doc}"));
        println!("{label}: {}", terms.join(" "));
    }
    Ok(())
}

fn query(matcher: &Matcher, text: &str, scores: bool) -> Result<()> {
    let result = matcher.query(text);
    println!("{}", serde_json::to_string_pretty(&result)?);
    if scores {
        for (doc, score) in matcher.index().scores(text).into_iter().enumerate() {
            println!("{doc}\t{score:.6}");
        }
    }
    Ok(())
}

fn walk(data: &Path, threshold: f64) -> Result<()> {
    let data = ChatData::load(data)?;
    let matcher = Matcher::new(data.knowledge).with_threshold(threshold);
    let graph = DialogGraph::new(data.questions, data.responses);
    let mut convo = Conversation::start(&graph);
    for msg in convo.messages() {
        println!("bot> {}", msg.text);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let options = convo.options();
        if options.is_empty() {
            println!("No more options. Thank you! (r = reset, q = quit)");
        } else {
            for (i, q) in options.iter().enumerate() {
                println!("  [{}] {}", i + 1, q.question);
            }
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let choice = line.trim();
        match choice {
            "q" | "quit" => break,
            "r" | "reset" => {
                convo.reset();
                for msg in convo.messages() {
                    println!("bot> {}", msg.text);
                }
                continue;
            }
            _ => {}
        }
        let picked = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i))
            .map(|q| q.id.clone());
        match picked {
            Some(id) => {
                if let Some(turn) = convo.choose(&id, &matcher) {
                    println!("you> {}", turn.user.text);
                    println!("bot> {}", turn.bot.text);
                }
            }
            None => println!("pick a number from the list"),
        }
    }
    Ok(())
}
