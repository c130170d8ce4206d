mod config;
mod config_cmd;
mod explain_cmd;

use clap::{Parser, Subcommand};
use config::{ConfigPaths, FileSettingsStore, apply_env_overrides};
use glossa_core::commands::command_specs;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "glossa", version, about = "explain selected text with a language model")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Explain, summarize, or translate a selection in a Markdown file
    Explain(explain_cmd::ExplainArgs),
    /// Show or edit settings
    Config(config_cmd::ConfigArgs),
    /// List the commands a host editor should register
    Commands,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = match ConfigPaths::from_env() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("config paths error: {err}");
            std::process::exit(1);
        }
    };
    let store = FileSettingsStore::new(paths);

    if let Command::Config(args) = &cli.command {
        if let Err(e) = config_cmd::run(args, &store) {
            eprintln!("config failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    let mut settings = match store.load_or_create() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("config load failed: {err}");
            std::process::exit(1);
        }
    };
    apply_env_overrides(&mut settings);

    match cli.command {
        Command::Explain(args) => {
            if let Err(e) = explain_cmd::run(&args, &settings) {
                eprintln!("explain failed: {e}");
                std::process::exit(1);
            }
        }
        Command::Commands => {
            for spec in command_specs(&settings) {
                if spec.hotkey.is_some() {
                    let label = settings.hotkey_label();
                    println!("{}\t{}\t{label}", spec.id, spec.name);
                } else {
                    println!("{}\t{}", spec.id, spec.name);
                }
            }
        }
        Command::Config(_) => {}
    }
}
