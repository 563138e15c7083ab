use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use regwatch::app::AppContext;
use regwatch::cli::{commands, Cli, Commands};
use regwatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Commands::Penalties {
        max_pages: Some(max_pages),
        ..
    } = &cli.command
    {
        config.crawler.max_pages = *max_pages;
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Penalties {
            provinces,
            json,
            progress,
            ..
        } => {
            commands::crawl_penalties(&ctx, &provinces, json, progress).await?;
        }
        Commands::Licenses { progress } => {
            commands::crawl_licenses(&ctx, progress).await?;
        }
        Commands::List {
            province,
            range,
            keyword,
        } => {
            commands::list_penalties(&ctx, province.as_deref(), range, keyword.as_deref())?;
        }
        Commands::Sites => {
            commands::list_sites(&ctx)?;
        }
        Commands::Download { province, dir } => {
            commands::download(&ctx, &province, dir).await?;
        }
    }

    Ok(())
}
