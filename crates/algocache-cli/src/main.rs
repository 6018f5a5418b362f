//! algocache CLI - inspect, warm and clear the offline content cache.
//!
//! Every read prints the best data available right now as JSON, then waits
//! for the background refresh so the cache is current when the process exits.

use std::io;

use algocache_core::api::SourceError;
use algocache_core::models::{AlgorithmCategory, AlgorithmId, ArticleId, Designation, TagId};
use algocache_core::{Config, Fetched, SyncContext, SyncError};
use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

const USAGE: &str = "\
Usage: algocache <command>

Commands:
  status                      Show configuration and cache ages
  warm                        Fetch every kind so it is available offline
  clear-cache                 Delete every cached record
  articles [--tag TAG]        List articles, optionally by tag
  article <id>                Show one article
  tags                        List tags
  algorithms [--category C]   List algorithms, optionally by category
  algorithm <id>              Show one algorithm
  intro <designation>         Show the intro sequence for a designation";

/// Parsed command line.
enum Command {
    Status,
    Warm,
    ClearCache,
    Articles { tag: Option<String> },
    Article { id: String },
    Tags,
    Algorithms { category: Option<String> },
    Algorithm { id: String },
    Intro { designation: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let config = Config::load()?;
    let context = SyncContext::from_config(&config)?;
    info!("algocache starting");

    match run(command, &config, &context).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", user_message(&e));
            std::process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        bail!("Missing command");
    };

    let command = match name.as_str() {
        "status" => Command::Status,
        "warm" => Command::Warm,
        "clear-cache" => Command::ClearCache,
        "articles" => Command::Articles {
            tag: flag_value(rest, "--tag")?,
        },
        "article" => Command::Article {
            id: positional(rest, "id")?,
        },
        "tags" => Command::Tags,
        "algorithms" => Command::Algorithms {
            category: flag_value(rest, "--category")?,
        },
        "algorithm" => Command::Algorithm {
            id: positional(rest, "id")?,
        },
        "intro" => Command::Intro {
            designation: positional(rest, "designation")?,
        },
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            std::process::exit(0);
        }
        other => bail!("Unknown command: {}", other),
    };
    Ok(command)
}

fn flag_value(rest: &[String], flag: &str) -> Result<Option<String>> {
    match rest {
        [] => Ok(None),
        [f, value] if f == flag => Ok(Some(value.clone())),
        _ => bail!("Expected at most `{} <value>`", flag),
    }
}

fn positional(rest: &[String], name: &str) -> Result<String> {
    match rest {
        [value] => Ok(value.clone()),
        _ => bail!("Expected exactly one <{}>", name),
    }
}

async fn run(command: Command, config: &Config, context: &SyncContext) -> Result<()> {
    match command {
        Command::Status => {
            let caches: Vec<_> = context
                .cache_status()
                .await
                .into_iter()
                .map(|(kind, age)| json!({ "kind": kind, "cached": age }))
                .collect();
            print_json(&json!({
                "api_base_url": config.api_base_url,
                "offline_mode": config.offline_mode,
                "cache_dir": config.cache_dir()?,
                "caches": caches,
            }))
        }
        Command::Warm => {
            let mut failed = 0;
            let outcomes: Vec<_> = context
                .warm_all()
                .await
                .into_iter()
                .map(|outcome| match outcome.result {
                    Ok(count) => json!({ "kind": outcome.kind, "records": count }),
                    Err(e) => {
                        failed += 1;
                        json!({ "kind": outcome.kind, "error": e.to_string() })
                    }
                })
                .collect();
            print_json(&json!(outcomes))?;
            if failed > 0 {
                bail!("{} of {} kinds could not be warmed", failed, outcomes.len());
            }
            Ok(())
        }
        Command::ClearCache => {
            context.clear_cache().await?;
            eprintln!("Cache cleared");
            Ok(())
        }
        Command::Articles { tag } => {
            let fetched = match tag {
                Some(tag) => context.articles.get_by_tag(TagId::new(tag)).await?,
                None => context.articles.get_all().await?,
            };
            report(fetched).await
        }
        Command::Article { id } => report(context.articles.get_by_id(&ArticleId::new(id)).await?).await,
        Command::Tags => report(context.tags.get_all().await?).await,
        Command::Algorithms { category } => {
            let fetched = match category {
                Some(category) => {
                    context
                        .algorithms
                        .get_by_category(AlgorithmCategory::new(category))
                        .await?
                }
                None => context.algorithms.get_all().await?,
            };
            report(fetched).await
        }
        Command::Algorithm { id } => {
            report(context.algorithms.get_by_id(&AlgorithmId::new(id)).await?).await
        }
        Command::Intro { designation } => {
            report(
                context
                    .intro
                    .get_by_designation(Designation::new(designation))
                    .await?,
            )
            .await
        }
    }
}

/// Print the immediate value, then wait for the background refresh.
async fn report<T>(fetched: Fetched<T>) -> Result<()>
where
    T: serde::Serialize + Send + 'static,
{
    let Fetched {
        value,
        origin,
        mut revalidation,
    } = fetched;
    print_json(&json!({ "origin": origin, "data": value }))?;

    if revalidation.stale().await.is_some() {
        eprintln!("Newer data arrived and has been cached; run the command again to see it.");
    }
    revalidation.settled().await;
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", text);
    Ok(())
}

/// Friendlier text for the errors a user can act on.
fn user_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<SyncError>() {
        Some(SyncError::Source(SourceError::Unauthorized)) => {
            "The server rejected the API token. Set ALGOCACHE_API_TOKEN and try again.".to_string()
        }
        Some(e) => e.to_string(),
        None => format!("{:#}", error),
    }
}
