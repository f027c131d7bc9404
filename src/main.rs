use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, TimeZone};
use clap::{Args, Parser, Subcommand};
use zimage::logger::{self, LoggerConfig};
use zimage::models::random_seed;
use zimage::{AppConfig, HistoryItem, Studio};

/// Generate images from text prompts and browse the local history.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Append log output to this file
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an image and add it to the history
    Generate(GenerateArgs),
    /// Browse past generations
    #[command(subcommand)]
    History(HistoryCommand),
    /// Manage the API key
    #[command(subcommand)]
    Key(KeyCommand),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Text prompt describing the image
    prompt: String,

    /// Seed for reproducible output; the service picks one if omitted
    #[arg(long, conflicts_with = "random_seed")]
    seed: Option<i64>,

    /// Pick a random seed locally and send it
    #[arg(long, default_value_t = false)]
    random_seed: bool,

    /// Also write the PNG to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List stored generations, newest first
    List,
    /// Show one record
    Show { id: String },
    /// Delete one record
    Delete { id: String },
    /// Write a record's image to a PNG file
    Export { id: String, path: Option<PathBuf> },
}

#[derive(Subcommand, Debug)]
enum KeyCommand {
    /// Save the API key
    Set { key: String },
    /// Remove the saved API key
    Clear,
    /// Show whether a key is configured
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::cli()
    };
    if let Some(path) = &cli.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("{}", e);
    }

    match dotenv::dotenv() {
        Ok(path) => log::debug!("✅ Loaded {}", path.display()),
        Err(_) => log::debug!("No .env file found, using process environment"),
    }

    let config = AppConfig::from_env();
    log::debug!("Endpoint: {}", config.api_url);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &AppConfig) -> zimage::Result<()> {
    let mut studio = Studio::open(config)?;

    match command {
        Command::Generate(args) => {
            let seed = if args.random_seed {
                Some(random_seed())
            } else {
                args.seed
            };
            let item = studio.generate(&args.prompt, seed).await?;
            print_item(&item);
            if let Some(path) = args.output {
                let written = studio.export(&item.id, Some(&path))?;
                println!("saved:     {}", written.display());
            }
        }
        Command::History(HistoryCommand::List) => {
            let items = studio.history().items();
            if items.is_empty() {
                println!("No history yet.");
            }
            for item in items {
                println!(
                    "{}  {}  seed={:<10}  {}",
                    item.id,
                    format_time(item.timestamp),
                    item.seed.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                    item.prompt
                );
            }
        }
        Command::History(HistoryCommand::Show { id }) => {
            let item = studio.select(&id)?.clone();
            print_item(&item);
        }
        Command::History(HistoryCommand::Delete { id }) => {
            if studio.delete(&id) {
                println!("Deleted {}", id);
            } else {
                println!("Nothing to delete for {}", id);
            }
        }
        Command::History(HistoryCommand::Export { id, path }) => {
            let written = studio.export(&id, path.as_deref())?;
            println!("{}", written.display());
        }
        Command::Key(KeyCommand::Set { key }) => {
            studio.credentials().save(&key)?;
            println!("API key saved.");
        }
        Command::Key(KeyCommand::Clear) => {
            studio.credentials().clear()?;
            println!("API key cleared.");
        }
        Command::Key(KeyCommand::Status) => match studio.credentials().masked() {
            Some(masked) => println!("SYSTEM LINKED ({})", masked),
            None => println!("OFFLINE (no API key, run `zimage key set <KEY>`)"),
        },
    }

    Ok(())
}

fn print_item(item: &HistoryItem) {
    println!("id:        {}", item.id);
    println!("created:   {}", format_time(item.timestamp));
    println!("prompt:    {}", item.prompt);
    println!(
        "seed:      {}",
        item.seed.map(|s| s.to_string()).unwrap_or_else(|| "random".into())
    );
    println!("payload:   {} base64 chars", item.payload().len());
}

fn format_time(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
