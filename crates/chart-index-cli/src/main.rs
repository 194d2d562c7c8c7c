//! Chart Index CLI
//!
//! Scans a repository for charts, builds their index, and narrows it to
//! what a subscription accepts.

mod cli;
mod error;
mod logging;

use std::io::Write;

use chart_index::{
    ChartfileLoader, IndexBuilder, Subscription, SubscriptionFilterPolicy, discover_chart_dirs,
    generate_index,
};
use clap::Parser;

use cli::Cli;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let subscription = Subscription::load(&cli.subscription)?;
    let policy = SubscriptionFilterPolicy::from(&subscription);

    let locations = discover_chart_dirs(&cli.root)?;
    tracing::info!(
        "Found {} chart(s) under {}",
        locations.len(),
        cli.root.display()
    );

    let builder = IndexBuilder::new(ChartfileLoader::new());
    let index = generate_index(&builder, &locations, &cli.root, &policy)?;

    let package = match policy.package_alias(&policy.package_name) {
        Some(alias) => format!("{} (alias {})", policy.package_name, alias),
        None => policy.package_name.clone(),
    };
    if index.is_empty() {
        tracing::warn!(
            "No version of {} matches subscription {}",
            package,
            policy.subscription
        );
    } else {
        tracing::info!(
            "{} version(s) of {} match subscription {}",
            index.version_count(),
            package,
            policy.subscription
        );
    }

    let yaml = index.to_yaml()?;
    match cli.output {
        Some(path) => std::fs::write(&path, yaml)?,
        None => std::io::stdout().write_all(yaml.as_bytes())?,
    }

    Ok(())
}
