use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gramdex::index::{BuildConfig, IndexData, build_from_dir};
use gramdex::query::{CandidateMatch, Substring};
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::Level;

#[derive(Parser)]
#[command(name = "gramdex")]
#[command(about = "Trigram substring search over a directory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON build config (repo_name, max_file_size, ignored_paths, skip_binary)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Search file contents (or names) for a substring
    Search {
        pattern: String,

        /// Path to search in
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Match file names instead of contents
        #[arg(short = 'f', long)]
        file_name: bool,

        /// Match case exactly
        #[arg(short = 's', long)]
        case_sensitive: bool,

        /// Print one JSON object per match
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show index statistics
    Stats {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path, config: Option<&Path>) -> Result<IndexData> {
    let config = match config {
        Some(p) => BuildConfig::from_json_file(p)?,
        None => BuildConfig::default(),
    };
    build_from_dir(path, &config).with_context(|| format!("Failed to index {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            pattern,
            path,
            file_name,
            case_sensitive,
            json,
            no_color,
        } => {
            let index = load(&path, cli.config.as_deref())?;
            let query = Substring {
                pattern,
                case_sensitive,
                file_name,
            };
            let matches = search(&index, &query)?;
            if json {
                print_json(&matches)?;
            } else {
                print_matches(&index, &matches, !no_color)?;
            }
        }
        Commands::Stats { path } => {
            let index = load(&path, cli.config.as_deref())?;
            show_stats(&index);
        }
    }

    Ok(())
}

/// Run the query and keep only verified matches
fn search(index: &IndexData, query: &Substring) -> Result<Vec<CandidateMatch>> {
    let mut iter = index.get_doc_iterator(query)?;
    let check = iter.needs_verification();

    let mut matches = Vec::new();
    for batch in iter.by_ref() {
        for cand in batch {
            if !check || index.verify(&cand)? {
                matches.push(cand);
            }
        }
    }
    Ok(matches)
}

fn print_json(matches: &[CandidateMatch]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for m in matches {
        serde_json::to_writer(&mut out, m)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_matches(index: &IndexData, matches: &[CandidateMatch], color: bool) -> Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    for m in matches {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(stdout, "{}", index.file_name(m.file))?;
        stdout.reset()?;
        write!(stdout, ":")?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "{}", m.offset)?;
        stdout.reset()?;
        writeln!(stdout)?;
    }
    Ok(())
}

fn show_stats(index: &IndexData) {
    println!("Index Statistics");
    println!("================");
    println!();
    println!("Repository:       {}", index.repo_name());
    println!("File count:       {}", index.num_files());
    println!("Content ngrams:   {}", index.ngram_count());
    if index.num_files() > 0 {
        let last = (index.num_files() - 1) as u32;
        println!("Content bytes:    {}", index.file_span(last).end);
    }
}
