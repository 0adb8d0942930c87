use anyhow::Context;
use clap::{Parser, Subcommand};
use dungeon_content::ContentLibrary;
use dungeon_kernel::GameState;
use dungeon_persist::SaveStore;
use dungeon_tools::{GameInspector, StatisticsReport};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod session;

use session::Session;

#[derive(Parser)]
#[command(name = "dungeon", about = "Explore an endless dungeon, one cell at a time")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding save slots
    #[arg(short, long, default_value = "dungeon_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively, resuming the latest save if there is one
    Play {
        /// Name of the hero for a new game
        #[arg(long, default_value = "Seth")]
        hero_name: String,
        /// Start a new game even if a save exists
        #[arg(long)]
        new: bool,
        /// Hint/poem/achievement library (.yaml, .yml or .json)
        #[arg(short, long)]
        content: Option<PathBuf>,
    },
    /// Print version and crate info
    Info,
    /// Summarize the latest save without playing it
    Inspect {
        /// Map radius around the hero
        #[arg(short, long, default_value = "5")]
        radius: u32,
    },
    /// Check the save hash chain
    Verify,
    /// Write the built-in hints, poems and achievements to a file to edit
    ExportContent {
        /// Destination (.yaml, .yml or .json)
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Play {
            hero_name,
            new,
            content,
        } => {
            let content = match content {
                Some(path) => ContentLibrary::load(&path)
                    .with_context(|| format!("failed to load content from {}", path.display()))?,
                None => ContentLibrary::builtin(),
            };
            let store = SaveStore::open(&cli.data_dir)
                .with_context(|| format!("failed to open {}", cli.data_dir.display()))?;
            let state = if !new && store.meta().save_count > 0 {
                store.load_latest().context("failed to resume the latest save")?
            } else {
                GameState::with_hero_name(hero_name)
            };

            let stdin = std::io::stdin();
            let mut session = Session::new(state, content, store);
            session.run(stdin.lock(), std::io::stdout())?;
        }
        Commands::Info => {
            println!("dungeon v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: origin={}", GameState::new().hero_position());
            println!("persist: {}", dungeon_persist::crate_info());
            println!("content: {}", dungeon_content::crate_info());
            println!("input: {}", dungeon_input::crate_info());
            println!("tools: {}", dungeon_tools::crate_info());
        }
        Commands::Inspect { radius } => {
            let store = SaveStore::open(&cli.data_dir)?;
            let state = store.load_latest().context("failed to load the latest save")?;
            println!("{}", GameInspector::summary(&state));
            println!("{}", GameInspector::describe_location(&state)?);
            print!("{}", GameInspector::explored_map(&state, radius));
            println!("{}", StatisticsReport::from_history(state.command_history()));
        }
        Commands::Verify => {
            let store = SaveStore::open(&cli.data_dir)?;
            store.verify_integrity()?;
            println!(
                "{} save(s) in {}: integrity OK",
                store.meta().save_count,
                store.root().display()
            );
        }
        Commands::ExportContent { path } => {
            ContentLibrary::builtin()
                .save(&path)
                .with_context(|| format!("failed to write content to {}", path.display()))?;
            println!("wrote built-in content to {}", path.display());
        }
    }

    Ok(())
}
