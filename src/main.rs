use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use topostore::config::{load_config, StoreConfig};
use topostore::metadata::FileSource;
use topostore::report::TopologyReport;
use topostore::topology::TopologyStore;

/// Resolve overlay topology from an inventory dump
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the inventory dump (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    inventory: PathBuf,

    /// Path to the store configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report whether an IP is local or remote (repeatable)
    #[arg(short, long)]
    query: Vec<String>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Inventory file: {:?}", args.inventory);

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => StoreConfig::default(),
    };

    let store = TopologyStore::new(FileSource::new(&args.inventory), config);
    store
        .reload()
        .wrap_err_with(|| format!("Failed to load topology from '{}'", args.inventory.display()))?;

    for ip in &args.query {
        let location = if store.is_remote(ip) { "remote" } else { "not remote" };
        info!("{}: {}", ip, location);
    }

    let report = TopologyReport::from(store.current().as_ref());
    match &args.output {
        Some(path) => {
            report
                .write_to(path)
                .wrap_err_with(|| format!("Failed to write report '{}'", path.display()))?;
            info!("Report written to: {:?}", path);
        }
        None => println!("{}", report.to_json()?),
    }

    Ok(())
}
