//! mediaq CLI - submit media downloads and follow them to completion.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mediaq_client::{HttpClient, RemoteTaskService};
use mediaq_core::{LifecycleState, MediaKind, QualityTier, TaskId};
use mediaq_engine::presentation::queue_line;
use mediaq_engine::{Config, Presenter, Session, TracingPresenter};

mod render;

use render::{JsonPresenter, TerminalPresenter};

/// mediaq - queue media downloads on a remote worker
#[derive(Parser)]
#[command(name = "mediaq")]
#[command(about = "Submit and track media conversion jobs", long_about = None)]
#[command(version)]
struct Cli {
    /// Base address of the download service
    #[arg(short, long, env = "MEDIAQ_API_URL", default_value = mediaq_engine::config::DEFAULT_API_URL)]
    api_url: String,

    /// Delay between status checks, in milliseconds
    #[arg(
        long,
        env = "MEDIAQ_POLL_INTERVAL_MS",
        default_value = "2000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_ms: u64,

    /// Failed status checks tolerated before a download is marked failed
    #[arg(
        long,
        env = "MEDIAQ_POLL_BUDGET",
        default_value = "300",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    poll_budget: u32,

    /// Print queue snapshots as JSON lines
    #[arg(long, conflicts_with = "quiet")]
    json: bool,

    /// Only log queue changes (visible with RUST_LOG=mediaq_engine=debug)
    #[arg(short = 'Q', long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one or more URLs and wait until every download finishes
    Download {
        /// Source URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// audio or video
        #[arg(short, long, default_value = "video")]
        media_type: String,

        /// Quality tier (video: 1080p, 720p, 360p; audio: excellent, good, ok)
        #[arg(short, long)]
        quality: Option<String>,
    },

    /// Show the remote status of a task
    Status {
        /// Task ID
        id: String,
    },

    /// List quality tiers per media type
    Formats,

    /// Check that the service is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mediaq_cli=info,mediaq_engine=info,mediaq_client=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = Config::default()
        .with_api_base_url(cli.api_url)
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .with_poll_budget(cli.poll_budget);
    let client = HttpClient::with_timeout(&config.api_base_url, config.request_timeout)?;

    match cli.command {
        Commands::Download {
            urls,
            media_type,
            quality,
        } => {
            let presenter: Arc<dyn Presenter> = if cli.json {
                Arc::new(JsonPresenter)
            } else if cli.quiet {
                Arc::new(TracingPresenter)
            } else {
                Arc::new(TerminalPresenter)
            };
            download(config, client, presenter, urls, &media_type, quality.as_deref()).await?;
        }
        Commands::Status { id } => {
            let report = client.task_status(&TaskId::new(id)).await?;
            println!("state: {}", report.state);
            if let Some(result) = report.result {
                println!("file:  {}", result.filename.unwrap_or_default());
                if let Some(size) = result.size {
                    println!("size:  {} bytes", size);
                }
            }
            if let Some(error) = report.error {
                println!("error: {}", error);
            }
        }
        Commands::Formats => {
            for kind in [MediaKind::Video, MediaKind::Audio] {
                println!("{}:", kind);
                for q in kind.qualities() {
                    println!("  {:<10} {}", q.as_str(), q.description());
                }
            }
        }
        Commands::Health => {
            if client.health().await? {
                println!("{} is healthy", config.api_base_url);
            } else {
                return Err(format!("{} reported unhealthy", config.api_base_url).into());
            }
        }
    }

    Ok(())
}

async fn download(
    config: Config,
    client: HttpClient,
    presenter: Arc<dyn Presenter>,
    urls: Vec<String>,
    media_type: &str,
    quality: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind: MediaKind = media_type.parse()?;
    let quality = match quality {
        Some(q) => QualityTier::parse(kind, q)?,
        None => QualityTier::default_for(kind),
    };

    info!(api = %config.api_base_url, count = urls.len(), "Starting downloads");
    let session = Arc::new(Session::new(config, Arc::new(client), presenter));

    let mut submissions = JoinSet::new();
    for url in urls {
        let session = session.clone();
        submissions.spawn(async move {
            let outcome = session.submit(&url, kind, quality).await;
            (url, outcome)
        });
    }

    let mut rejected = 0usize;
    while let Some(joined) = submissions.join_next().await {
        match joined {
            Ok((_, Ok(task))) => info!(task_id = %task.id, "Accepted"),
            Ok((url, Err(e))) => {
                rejected += 1;
                error!(url = %url, error = %e, "Submission rejected");
            }
            Err(e) => {
                rejected += 1;
                error!(error = %e, "Submission task panicked");
            }
        }
    }

    tokio::select! {
        _ = session.wait_until_settled() => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping status checks");
            session.shutdown();
        }
    }

    let tasks = session.tasks();
    let failed = tasks
        .iter()
        .filter(|t| t.state == LifecycleState::Failure)
        .count();

    println!();
    for task in &tasks {
        println!("{}", queue_line(task));
    }

    let incomplete = failed + rejected;
    if incomplete > 0 {
        let total = tasks.len() + rejected;
        return Err(format!("{} of {} download(s) did not complete", incomplete, total).into());
    }
    Ok(())
}
