use clap::{Parser, Subcommand};
use std::path::PathBuf;

use turnpage_core::config::{config_path, load_config};
use turnpage_core::history::JsonHistoryStore;
use turnpage_core::session::ReadingSession;

#[derive(Parser)]
#[command(name = "turnpage")]
#[command(about = "Paged reader for local text books and remote chapter sites")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// History store file (defaults to the user data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a book (local path or chapter URL) and show the first page
    Open {
        /// Local file path or chapter URL of a supported site
        path_or_url: String,
    },

    /// Show the next page of the current book
    Next,

    /// Show the previous page of the current book
    Prev,

    /// Search the current book for a keyword
    Search {
        keyword: String,

        /// Commit hit number N as the new reading position
        #[arg(long, value_name = "N")]
        select: Option<usize>,
    },

    /// Jump to an absolute offset in the current book
    Goto {
        offset: u64,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config();

    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Show => print!("{}", toml::to_string_pretty(&config)?),
            ConfigAction::Path => match config_path() {
                Some(p) => println!("{}", p.display()),
                None => println!("(no config dir on this platform)"),
            },
        }
        return Ok(());
    }

    let store_path = cli
        .store
        .clone()
        .or_else(JsonHistoryStore::default_path)
        .ok_or("no data directory available; pass --store")?;
    let store = JsonHistoryStore::open(&store_path)?;
    let mut session = ReadingSession::new(&config, store);

    match &cli.command {
        Commands::Open { path_or_url } => println!("{}", session.load(path_or_url)?),
        Commands::Next => println!("{}", session.next_page()?),
        Commands::Prev => println!("{}", session.prev_page()?),
        Commands::Goto { offset } => println!("{}", session.goto(*offset)?),
        Commands::Search { keyword, select } => {
            let hits = session.search(keyword)?;
            match select {
                Some(n) => {
                    let hit = hits.get(*n).ok_or("no search result with that number")?;
                    println!("{}", session.select_result(hit)?);
                }
                None => {
                    for (idx, hit) in hits.iter().enumerate() {
                        println!("{idx}\t{}\t{}", hit.offset, hit.snippet);
                    }
                }
            }
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
