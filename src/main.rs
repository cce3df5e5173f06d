use anyhow::{Context, Result};
use clap::Parser;
use memcalc_buildpack::cli::{Cli, Commands};
use memcalc_buildpack::config::{
    Configuration, LaunchEnvironment, resolve_app_root, resolve_cache_dir, resolve_configuration,
};
use memcalc_buildpack::counter;
use memcalc_buildpack::download::{CachingDownloader, Downloader};
use memcalc_buildpack::droplet::Droplet;
use memcalc_buildpack::lifecycle::{COMPONENT_ID, MemoryCalculator, StagingContext};
use memcalc_buildpack::platform::Platform;
use serde::Serialize;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let configuration = resolve_configuration(&cli).context("Failed to load configuration")?;
    let downloader = CachingDownloader::new(resolve_cache_dir(&cli)?)?;

    match cli.command {
        Commands::Count => {
            let app_root = resolve_app_root(&cli);
            let count = counter::resolve(&app_root, &configuration)
                .with_context(|| format!("Failed to count classes in {}", app_root.display()))?;
            print_json(&count)?;
        }
        Commands::Detect => {
            println!("{}", stage(&cli, configuration, &downloader)?.detect());
        }
        Commands::Compile => {
            let summary = stage(&cli, configuration, &downloader)?
                .compile()
                .context("Failed to install the memory calculator")?;
            print_json(&summary)?;
        }
        Commands::Release => {
            let output = stage(&cli, configuration, &downloader)?
                .release()
                .context("Failed to compose the memory calculation command")?;
            print_json(&output)?;
        }
    }

    Ok(())
}

fn stage<'a>(
    cli: &Cli,
    configuration: Configuration,
    downloader: &'a dyn Downloader,
) -> Result<MemoryCalculator<'a>> {
    let platform = Platform::detect();
    let (version, uri) = MemoryCalculator::resolve(&configuration, platform, downloader)
        .context("Failed to resolve the memory calculator version")?;

    let context = StagingContext {
        configuration,
        environment: LaunchEnvironment::from_env(),
        application_root: resolve_app_root(cli),
        droplet: Droplet::new(cli.droplet.clone(), COMPONENT_ID),
        platform,
    };
    Ok(MemoryCalculator::new(version, uri, context, downloader))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
