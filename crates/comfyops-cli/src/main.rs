//! CLI entry point.
//!
//! Loads `.env`, parses arguments, installs logging on stderr and routes
//! each command to its handler. Failures exit with the code mapped by
//! [`CliError::exit_code`].

use clap::Parser;
use tracing_subscriber::EnvFilter;

use comfyops_cli::handlers::download::DownloadArgs;
use comfyops_cli::handlers::run::RunArgs;
use comfyops_cli::{Cli, CliError, Commands, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            workflow,
            host,
            port,
            poll,
            timeout,
        } => {
            handlers::run::execute(RunArgs {
                workflow: &workflow,
                host: &host,
                port,
                poll,
                timeout,
            })
            .await
        }
        Commands::Download {
            urls,
            target,
            overwrite,
            no_pget,
            json,
            bin_dir,
        } => {
            handlers::download::execute(DownloadArgs {
                urls: &urls,
                target: &target,
                overwrite,
                no_pget,
                json,
                bin_dir: bin_dir.as_deref(),
            })
            .await
        }
        Commands::Resolve { urls, target } => handlers::resolve::execute(&urls, &target).await,
        Commands::Paths { base } => handlers::paths::execute(base.as_deref()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }

    Ok(())
}
