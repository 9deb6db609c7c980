//! Binary entrypoint for the roommap CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `route <from> <to>` - print the shortest route and its travel time
//! - `nearest <from> <tag> [--all]` - nearest room(s) carrying a tag
//! - `lookup <query>` - find rooms by id, `u<uid>` or title text
//! - `tags` - list every tag in the map
//! - `export [--output <file>]` - write the map in its JSON wire format
//!
//! Rooms may be given as an id, a `u<uid>` or a piece of a title.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};

use roommap::config::Config;
use roommap::map::{registry_to_json, JsonFileLoader, PathEngine, Registry, RoomId};

#[derive(Parser)]
#[command(name = "roommap")]
#[command(about = "Route planning over a game room map")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Shortest route between two rooms
    Route {
        from: String,
        to: String,
    },
    /// Nearest room with a tag
    Nearest {
        from: String,
        tag: String,
        /// List every reachable tagged room, nearest first
        #[arg(short, long)]
        all: bool,
    },
    /// Look rooms up by id, uid (u1234) or title
    Lookup {
        query: String,
    },
    /// List all tags in the map
    Tags,
    /// Export the map as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    let registry = Registry::new(JsonFileLoader::new(&config.map.data_file));
    registry.ensure_loaded()?;
    let rooms = registry.snapshot();
    let engine = PathEngine::with_default_cost(&rooms, config.map.default_cost());
    debug!("Map ready: {} rooms", rooms.len());

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Route { from, to } => {
            let from = resolve_room(&registry, &from)?;
            let to = resolve_room(&registry, &to)?;
            match engine.route(from, to) {
                Some(route) => {
                    for step in &route.steps {
                        println!("{:>6} -> {:<6} {}", step.from, step.to, step.edge);
                    }
                    println!(
                        "{} steps, estimated time {:.2}",
                        route.steps.len(),
                        route.total_time
                    );
                }
                None => println!("No route from {} to {}", from, to),
            }
        }
        Commands::Nearest { from, tag, all } => {
            let from = resolve_room(&registry, &from)?;
            let found = if all {
                engine.find_all_nearest_by_tag(from, &tag)
            } else {
                engine.find_nearest_by_tag(from, &tag).into_iter().collect()
            };
            if found.is_empty() {
                println!("No reachable room tagged '{}'", tag);
            }
            for id in found {
                let time = engine.distance_between(from, id).unwrap_or_default();
                match registry.get(id) {
                    Some(room) => println!("{} ({:.2})", room, time),
                    None => println!("#{} ({:.2})", id, time),
                }
            }
        }
        Commands::Lookup { query } => {
            let rooms = registry.lookup(&query);
            if rooms.is_empty() {
                println!("No room matches '{}'", query);
            }
            for room in rooms {
                println!("{}", room);
            }
        }
        Commands::Tags => {
            for tag in registry.tags() {
                println!("{}", tag);
            }
        }
        Commands::Export { output } => {
            let json = registry_to_json(&rooms)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    info!("Exported {} rooms to {}", rooms.len(), path);
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

fn resolve_room(registry: &Registry, query: &str) -> Result<RoomId> {
    registry
        .lookup(query)
        .first()
        .map(|room| room.id)
        .ok_or_else(|| anyhow!("No room matches '{}'", query))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let level = match verbosity {
        0 => config
            .as_ref()
            .map(|cfg| cfg.log_level())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console too when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
