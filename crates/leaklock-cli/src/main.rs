//! LeakLock CLI
//!
//! The `leaklock` command manages delivery targets and fires subscription
//! events at them.
//!
//! ## Commands
//!
//! - `target`: add, list, enable, disable or remove delivery targets
//! - `dispatch`: deliver an event to every enabled target and print the summary
//! - `assist`: answer a cancel / pause / renew question for a provider
//! - `subscriptions`: seed demo subscriptions or summarise a listing

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use leaklock_core::provider_guide::{self, ProviderAction};
use leaklock_core::{
    builtin_templates, filter_and_sort, seed_subscriptions, summarize, DispatchConfig,
    DispatchSummary, Dispatcher, HttpDeliverer, StaticTokenAuthenticator, Subscription,
    SubscriptionFilter, SubscriptionStatus, METRICS,
};
use leaklock_state::{
    NewTarget, OwnerId, SurrealHandle, SurrealTargetRegistry, TargetId, TargetRegistry,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "leaklock")]
#[command(author = "LeakLock Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Subscription tracking backend: event fan-out and provider assistant", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage delivery targets
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },

    /// Deliver an event to every enabled target registered for it
    Dispatch {
        /// Event type, e.g. subscription.created
        #[arg(short, long)]
        event_type: String,

        /// Owner to dispatch for (ignored when --token is given)
        #[arg(short, long, env = "LEAKLOCK_OWNER")]
        owner: Option<String>,

        /// Bearer token resolved against LEAKLOCK_TOKENS
        #[arg(long)]
        token: Option<String>,

        /// Inline JSON payload
        #[arg(short, long, conflicts_with = "payload_file")]
        payload: Option<String>,

        /// Read the JSON payload from a file
        #[arg(long)]
        payload_file: Option<PathBuf>,
    },

    /// Answer a subscription management question
    Assist {
        /// Intent JSON as produced by the intent model, e.g. {"action":"cancel","service":"netflix"}
        #[arg(long, conflicts_with_all = ["action", "service"])]
        intent: Option<String>,

        /// cancel, pause or renew
        #[arg(short, long, default_value = "unknown")]
        action: String,

        /// Provider name, e.g. "amazon prime"
        #[arg(short, long, default_value = "unknown")]
        service: String,
    },

    /// Demo subscription data
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionAction,
    },
}

#[derive(Subcommand)]
enum TargetAction {
    /// Register a new target
    Add {
        #[arg(short, long, env = "LEAKLOCK_OWNER")]
        owner: String,

        #[arg(short, long)]
        event_type: String,

        /// http(s) endpoint that receives the POST
        #[arg(long)]
        endpoint: String,

        /// Label shown in dispatch summaries
        #[arg(short, long)]
        name: String,

        /// Register without enabling
        #[arg(long)]
        disabled: bool,
    },

    /// List an owner's targets
    List {
        #[arg(short, long, env = "LEAKLOCK_OWNER")]
        owner: String,
    },

    /// Enable a target
    Enable { id: String },

    /// Disable a target
    Disable { id: String },

    /// Delete a target
    Remove { id: String },
}

#[derive(Subcommand)]
enum SubscriptionAction {
    /// Generate 6-9 random subscriptions from the built-in catalogue
    Seed {
        #[arg(short, long, env = "LEAKLOCK_OWNER")]
        owner: String,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Base date for next billing dates (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Write the subscriptions to this file instead of stdout
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,

        /// Reseed even if the output file already holds subscriptions
        #[arg(long, requires = "output")]
        force: bool,
    },

    /// Filter and summarise a subscription listing (JSON file)
    Summary {
        /// File produced by `subscriptions seed --output`
        file: PathBuf,

        #[arg(long)]
        status: Option<SubscriptionStatus>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        provider: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    leaklock_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Target { action } => {
            let registry = connect_registry().await?;
            match action {
                TargetAction::Add {
                    owner,
                    event_type,
                    endpoint,
                    name,
                    disabled,
                } => {
                    cmd_target_add(&registry, &owner, &event_type, &endpoint, &name, disabled)
                        .await
                }
                TargetAction::List { owner } => cmd_target_list(&registry, &owner).await,
                TargetAction::Enable { id } => cmd_target_set_enabled(&registry, &id, true).await,
                TargetAction::Disable { id } => cmd_target_set_enabled(&registry, &id, false).await,
                TargetAction::Remove { id } => cmd_target_remove(&registry, &id).await,
            }
        }
        Commands::Dispatch {
            event_type,
            owner,
            token,
            payload,
            payload_file,
        } => {
            let registry = connect_registry().await?;
            let payload = read_payload(payload.as_deref(), payload_file.as_deref())?;
            let result = cmd_dispatch(
                registry,
                &event_type,
                owner.as_deref(),
                token.as_deref(),
                payload,
            )
            .await;
            METRICS.flush();
            result
        }
        Commands::Assist {
            intent,
            action,
            service,
        } => cmd_assist(intent.as_deref(), &action, &service),
        Commands::Subscriptions { action } => match action {
            SubscriptionAction::Seed {
                owner,
                seed,
                today,
                output,
                force,
            } => cmd_subscriptions_seed(&owner, seed, today, output.as_deref(), force),
            SubscriptionAction::Summary {
                file,
                status,
                category,
                provider,
            } => cmd_subscriptions_summary(
                &file,
                SubscriptionFilter {
                    status,
                    category,
                    provider,
                },
            ),
        },
    }
}

async fn connect_registry() -> Result<Arc<SurrealTargetRegistry>> {
    let handle = SurrealHandle::setup_from_env()
        .await
        .context("Failed to connect to LeakLock database")?;
    Ok(Arc::new(SurrealTargetRegistry::new(Arc::new(handle))))
}

fn parse_owner(raw: &str) -> Result<OwnerId> {
    OwnerId::parse(raw).context("Owner must not be empty")
}

/// Register a target
async fn cmd_target_add(
    registry: &SurrealTargetRegistry,
    owner: &str,
    event_type: &str,
    endpoint: &str,
    name: &str,
    disabled: bool,
) -> Result<()> {
    let mut target = NewTarget::new(parse_owner(owner)?, event_type, endpoint, name);
    if disabled {
        target = target.disabled();
    }

    let stored = registry
        .register_target(target)
        .await
        .context("Failed to register target")?;

    println!(
        "Registered target '{}' ({}) for {} -> {}",
        stored.display_name, stored.id, stored.event_type, stored.endpoint
    );
    if !stored.enabled {
        println!("  (disabled)");
    }
    Ok(())
}

/// List targets for an owner
async fn cmd_target_list(registry: &SurrealTargetRegistry, owner: &str) -> Result<()> {
    let targets = registry.list_targets(&parse_owner(owner)?).await?;

    if targets.is_empty() {
        println!("No targets registered for '{}'", owner);
        return Ok(());
    }

    for target in targets {
        let marker = if target.enabled { "* " } else { "  " };
        println!(
            "{}{}  {:<28} {:<20} {}",
            marker, target.id, target.event_type, target.display_name, target.endpoint
        );
    }
    Ok(())
}

async fn cmd_target_set_enabled(
    registry: &SurrealTargetRegistry,
    id: &str,
    enabled: bool,
) -> Result<()> {
    let target = registry
        .set_enabled(&TargetId(id.to_string()), enabled)
        .await
        .with_context(|| format!("Failed to update target '{}'", id))?;

    let state = if target.enabled { "Enabled" } else { "Disabled" };
    println!("{} target '{}' ({})", state, target.display_name, target.id);
    Ok(())
}

async fn cmd_target_remove(registry: &SurrealTargetRegistry, id: &str) -> Result<()> {
    registry
        .remove_target(&TargetId(id.to_string()))
        .await
        .with_context(|| format!("Failed to remove target '{}'", id))?;

    println!("Removed target '{}'", id);
    Ok(())
}

fn read_payload(inline: Option<&str>, file: Option<&Path>) -> Result<Value> {
    match (inline, file) {
        (Some(text), _) => serde_json::from_str(text).context("Payload is not valid JSON"),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read payload file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", path.display()))
        }
        (None, None) => Ok(json!({})),
    }
}

/// Fan an event out and print the summary
async fn cmd_dispatch(
    registry: Arc<SurrealTargetRegistry>,
    event_type: &str,
    owner: Option<&str>,
    token: Option<&str>,
    payload: Value,
) -> Result<()> {
    let config = DispatchConfig::from_env()?;
    let deliverer = Arc::new(HttpDeliverer::new(config)?);
    let dispatcher = Dispatcher::new(registry, deliverer);

    let summary = match (token, owner) {
        (Some(token), _) => {
            let auth = StaticTokenAuthenticator::from_env()?;
            dispatcher
                .dispatch_authenticated(&auth, Some(token), event_type, payload)
                .await?
        }
        (None, Some(owner)) => {
            dispatcher
                .dispatch(&parse_owner(owner)?, event_type, payload)
                .await?
        }
        (None, None) => bail!("Either --owner or --token is required"),
    };

    info!(
        total = summary.total_targets,
        failed = summary.failed,
        "dispatch finished"
    );
    println!("{}", serde_json::to_string_pretty(&dispatch_response(&summary))?);
    Ok(())
}

fn dispatch_response(summary: &DispatchSummary) -> Value {
    json!({
        "success": true,
        "message": summary.response_message(),
        "results": summary,
    })
}

fn cmd_assist(intent: Option<&str>, action: &str, service: &str) -> Result<()> {
    let reply = match intent {
        Some(text) => provider_guide::respond_to_intent(text),
        None => provider_guide::respond(ProviderAction::parse(action), service),
    };

    println!("{}", reply.response);
    if let Some(url) = &reply.provider_url {
        println!();
        println!("Manage it here: {}", url);
    }
    Ok(())
}

fn cmd_subscriptions_seed(
    owner: &str,
    seed: Option<u64>,
    today: Option<NaiveDate>,
    output: Option<&Path>,
    force: bool,
) -> Result<()> {
    let owner = parse_owner(owner)?;
    if let (Some(path), false) = (output, force) {
        if let Some(existing) = existing_listing(path)? {
            println!("{}", serde_json::to_string_pretty(&existing)?);
            eprintln!(
                "{} already holds {} subscriptions; pass --force to reseed",
                path.display(),
                existing.len()
            );
            return Ok(());
        }
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let today = today.unwrap_or_else(|| Utc::now().date_naive());

    let subs = seed_subscriptions(&mut rng, &owner, &builtin_templates(), today)?;
    let text = serde_json::to_string_pretty(&subs)?;

    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Seeded {} subscriptions into {}", subs.len(), path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Subscriptions already stored at `path`, if it exists and is non-empty.
fn existing_listing(path: &Path) -> Result<Option<Vec<Subscription>>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    let subs: Vec<Subscription> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a subscription listing", path.display()))?;
    Ok((!subs.is_empty()).then_some(subs))
}

fn cmd_subscriptions_summary(file: &Path, filter: SubscriptionFilter) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let subs: Vec<Subscription> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a subscription listing", file.display()))?;

    let selected = filter_and_sort(&subs, &filter);
    let summary = summarize(&selected);

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "subscriptions": selected,
            "summary": summary,
        }))?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaklock_core::DeliveryOutcome;

    #[test]
    fn parses_dispatch_command() {
        let cli = Cli::try_parse_from([
            "leaklock",
            "dispatch",
            "--event-type",
            "subscription.created",
            "--owner",
            "user-1",
            "--payload",
            r#"{"id": 1}"#,
        ])
        .unwrap();

        match cli.command {
            Commands::Dispatch {
                event_type,
                owner,
                payload,
                ..
            } => {
                assert_eq!(event_type, "subscription.created");
                assert_eq!(owner.as_deref(), Some("user-1"));
                assert_eq!(payload.as_deref(), Some(r#"{"id": 1}"#));
            }
            _ => panic!("expected dispatch"),
        }
    }

    #[test]
    fn payload_and_payload_file_conflict() {
        let result = Cli::try_parse_from([
            "leaklock",
            "dispatch",
            "-e",
            "subscription.created",
            "--payload",
            "{}",
            "--payload-file",
            "p.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_summary_status_filter() {
        let cli = Cli::try_parse_from([
            "leaklock",
            "subscriptions",
            "summary",
            "subs.json",
            "--status",
            "paused",
        ])
        .unwrap();

        match cli.command {
            Commands::Subscriptions {
                action: SubscriptionAction::Summary { status, .. },
            } => assert_eq!(status, Some(SubscriptionStatus::Paused)),
            _ => panic!("expected subscriptions summary"),
        }
    }

    #[test]
    fn force_requires_output() {
        let result = Cli::try_parse_from([
            "leaklock",
            "subscriptions",
            "seed",
            "--owner",
            "user-1",
            "--force",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn seed_keeps_existing_listing_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        assert!(existing_listing(&path).unwrap().is_none());

        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        cmd_subscriptions_seed("user-1", Some(7), Some(day), Some(&path), false).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        let stored = existing_listing(&path).unwrap().unwrap();
        assert!(!stored.is_empty());

        cmd_subscriptions_seed("user-1", Some(8), Some(day), Some(&path), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);

        cmd_subscriptions_seed("user-1", Some(8), Some(day), Some(&path), true).unwrap();
        let reseeded: Vec<Subscription> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!reseeded.is_empty());
        assert!(reseeded.iter().all(|s| s.owner.as_str() == "user-1"));
    }

    #[test]
    fn existing_listing_treats_empty_array_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(existing_listing(&path).unwrap().is_none());

        std::fs::write(&path, "not json").unwrap();
        assert!(existing_listing(&path).is_err());
    }

    #[test]
    fn read_payload_defaults_to_empty_object() {
        assert_eq!(read_payload(None, None).unwrap(), json!({}));
        assert_eq!(
            read_payload(Some(r#"{"a": [1]}"#), None).unwrap(),
            json!({"a": [1]})
        );
        assert!(read_payload(Some("not json"), None).is_err());
    }

    #[test]
    fn dispatch_response_shape() {
        let summary = DispatchSummary {
            total_targets: 1,
            succeeded: 1,
            failed: 0,
            outcomes: vec![DeliveryOutcome::success("Ledger")],
        };
        let value = dispatch_response(&summary);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Webhooks triggered");
        assert_eq!(value["results"]["totalTargets"], 1);
    }
}
