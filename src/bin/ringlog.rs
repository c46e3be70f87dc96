//! ringlog CLI
//!
//! Writes to and inspects a ringlog queue file.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use ringlog::{Config, Level, Logger};
use tracing_subscriber::{fmt, EnvFilter};

/// ringlog CLI
#[derive(Parser, Debug)]
#[command(name = "ringlog")]
#[command(about = "Durable circular log for diagnostic breadcrumbs")]
#[command(version)]
struct Args {
    /// Queue file
    #[arg(short, long, default_value = "app_logs.queue")]
    file: PathBuf,

    /// Tag stamped on appended entries
    #[arg(short, long, default_value = "MainActivity")]
    tag: String,

    /// Keep at most this many entries
    #[arg(long)]
    max_entries: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a sample session, read it back and rotate it
    Demo,

    /// Append one entry
    Append {
        /// Entry level (debug, info, warn, error)
        #[arg(short, long, default_value = "info")]
        level: Level,

        /// The message to log
        message: String,
    },

    /// Print entries oldest first
    Dump {
        /// Print at most this many entries
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Print the number of stored entries
    Count,

    /// Remove the oldest entries
    Trim {
        /// How many entries to remove
        count: usize,
    },

    /// Remove every entry
    Clear,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,ringlog=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> ringlog::Result<()> {
    let mut builder = Config::builder().path(&args.file).tag(&args.tag);
    if let Some(max) = args.max_entries {
        builder = builder.max_entries(max);
    }
    let mut logger = Logger::open(builder.build())?;

    match args.command {
        Commands::Demo => demo(&mut logger)?,
        Commands::Append { level, message } => logger.log(level, message)?,
        Commands::Dump { count } => match count {
            Some(count) => {
                for entry in logger.read_latest_n(count)? {
                    println!("{}", entry);
                }
            }
            None => print_all(&mut logger)?,
        },
        Commands::Count => println!("{}", logger.log_count()?),
        Commands::Trim { count } => {
            let removed = logger.remove_processed_logs(count)?;
            println!("Removed {} entries", removed);
        }
        Commands::Clear => logger.clear_old_logs()?,
    }

    logger.close()
}

fn demo(logger: &mut Logger) -> ringlog::Result<()> {
    logger.info("Application started")?;
    logger.debug("Loading configuration")?;
    logger.warning("Low memory detected")?;
    logger.error("Network connection failed")?;
    logger.info("User logged in: john_doe")?;

    println!("Logged {} entries", logger.log_count()?);

    println!("=== All Log Entries ===");
    print_all(logger)?;

    println!("=== Latest 3 Entries ===");
    for entry in logger.read_latest_n(3)? {
        println!("{}", entry);
    }

    logger.remove_processed_logs(2)?;
    println!();
    println!("After removing 2 old entries:");
    print_all(logger)
}

fn print_all(logger: &mut Logger) -> ringlog::Result<()> {
    for entry in logger.read_all()? {
        match entry {
            Ok(entry) => println!("{}", entry),
            Err(e) => println!("<unreadable entry: {}>", e),
        }
    }
    Ok(())
}
