//! ami-query CLI - cached, queryable machine image inventory

use clap::Parser;

use ami_query::cli::{self, Cli, CommandContext, Commands, GlobalOptions};
use ami_query::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Log to stderr. `--debug` forces debug level; otherwise `RUST_LOG` applies,
/// defaulting to info.
fn init_logging(debug: bool) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Run => cli::run::run(CommandContext::new(&opts)?).await,
        Commands::Query { query } => cli::query::run(CommandContext::new(&opts)?, &query).await,
        Commands::Regions => cli::regions::run(&opts),
        Commands::Version => {
            println!("ami-query version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
