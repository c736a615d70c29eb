//! Maintenance CLI over a persisted URL catalog.
//!
//! The fetch loop itself belongs to an external crawler driven through the
//! library's `PageFetcher` seam. This binary covers the offline side:
//! status, lookups, children queries, and re-deriving the hierarchy after
//! the normalization rule changes.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::info;

use sitecatalog::{CatalogConfig, CatalogStore, RuleRegistry, SpiderStatus, UrlCatalog};

const USAGE: &str = "\
Usage: sitecatalog --base-url URL --storage-dir DIR [--rule ID] [--verbose] <command> [args]

Commands:
  status              print the derived crawl status
  has <url>           check whether a raw URL is cataloged
  children <url>      list the cataloged children of a URL
  show <url>          print the processed entry for a raw or processed URL
  reprocess           re-derive the whole hierarchy under the configured rule
";

struct CliArgs {
    config: CatalogConfig,
    verbose: bool,
    command: Vec<String>,
}

fn parse_args() -> Result<CliArgs> {
    let mut base_url = None;
    let mut storage_dir = None;
    let mut rule_id = None;
    let mut verbose = false;
    let mut command = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--base-url" => base_url = args.next(),
            "--storage-dir" => storage_dir = args.next(),
            "--rule" => rule_id = args.next(),
            "--verbose" => verbose = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ => command.push(arg),
        }
    }

    let Some(base_url) = base_url else {
        bail!("--base-url is required\n\n{USAGE}");
    };
    let Some(storage_dir) = storage_dir else {
        bail!("--storage-dir is required\n\n{USAGE}");
    };

    let mut builder = CatalogConfig::builder()
        .storage_dir(storage_dir)
        .base_url(base_url);
    if let Some(rule_id) = rule_id {
        builder = builder.rule_id(rule_id);
    }
    let config = builder.build().context("invalid configuration")?;

    Ok(CliArgs {
        config,
        verbose,
        command,
    })
}

async fn load_catalog(config: &CatalogConfig, store: &CatalogStore) -> Result<UrlCatalog> {
    let registry = RuleRegistry::with_defaults();
    let rule = registry
        .get(config.rule_id())
        .context("failed to resolve the configured normalization rule")?;
    let (regular, inferred) = store.load().await;
    Ok(UrlCatalog::from_parts(
        config.base_url().clone(),
        Arc::clone(&rule),
        regular,
        inferred,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let store = CatalogStore::new(args.config.storage_dir());

    match args.command.first().map(String::as_str) {
        Some("status") => {
            let status = store.spider_status();
            let label = match status {
                SpiderStatus::NotStarted => "not started",
                SpiderStatus::Partial => "partial (resumable)",
                SpiderStatus::Complete => "complete",
            };
            println!("{label}");
        }
        Some("has") => {
            let url = command_arg(&args.command)?;
            let catalog = load_catalog(&args.config, &store).await?;
            println!("{}", catalog.has_url(url)?);
        }
        Some("children") => {
            let url = command_arg(&args.command)?;
            let catalog = load_catalog(&args.config, &store).await?;
            let mut children = catalog.children_of(url);
            children.sort();
            for child in children {
                println!("{child}");
            }
        }
        Some("show") => {
            let url = command_arg(&args.command)?;
            let catalog = load_catalog(&args.config, &store).await?;
            match catalog.processed_url(url) {
                Some(entry) => println!("{} ({})", entry.url, entry.mime),
                None => bail!("'{url}' is not in the catalog"),
            }
        }
        Some("reprocess") => {
            let mut catalog = load_catalog(&args.config, &store).await?;
            catalog.reprocess_urls();
            store.save(&catalog).await?;
            info!(
                "reprocessed {} URLs ({} inferred) under rule '{}'",
                catalog.len(),
                catalog.inferred_len(),
                args.config.rule_id()
            );
        }
        Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    }

    Ok(())
}

fn command_arg(command: &[String]) -> Result<&str> {
    command
        .get(1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing URL argument\n\n{USAGE}"))
}
