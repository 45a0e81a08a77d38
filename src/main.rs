mod audit;
mod checks;
mod cli;
mod error;
mod fmt;
mod loader;
mod models;
mod report;
mod settings;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dq_audit=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();

    let result = match cli.command {
        Commands::Init => cli::init::run(data_dir),
        Commands::Run {
            transactions,
            fx,
            run_id,
            no_persist,
            fail_on_error,
        } => cli::run::run(data_dir, &transactions, &fx, run_id, !no_persist, fail_on_error),
        Commands::Check {
            transactions,
            fx,
            json,
            fail_on_error,
        } => cli::check::run(&transactions, &fx, json, fail_on_error),
        Commands::History { limit, run_id } => cli::history::run(data_dir, limit, run_id.as_deref()),
        Commands::Rules => {
            cli::rules::list();
            Ok(())
        }
        Commands::Status => cli::status::run(data_dir),
        Commands::Backup { output } => cli::backup::run(data_dir, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
