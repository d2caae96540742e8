use chrono::Utc;
use clap::{Parser, Subcommand};
use search_poll_core::{
    ContentRegion, HttpSearchBackend, PollConfig, PollError, SearchBackend, SearchPoller,
    SearchTask,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "search-poll", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the search service
    #[arg(long, env = "SEARCH_POLL_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Delay between index readiness checks, in milliseconds
    #[arg(long, env = "SEARCH_POLL_READINESS_INTERVAL_MS", default_value = "1000")]
    readiness_interval_ms: u64,

    /// Delay between result polls, in milliseconds
    #[arg(long, env = "SEARCH_POLL_RESULT_INTERVAL_MS", default_value = "500")]
    result_interval_ms: u64,

    /// Give up after this many readiness checks (unbounded by default)
    #[arg(long, env = "SEARCH_POLL_MAX_READINESS_POLLS")]
    max_readiness_polls: Option<u32>,

    /// Give up after this many result polls (unbounded by default)
    #[arg(long, env = "SEARCH_POLL_MAX_RESULT_POLLS")]
    max_result_polls: Option<u32>,

    /// Per-request timeout, in milliseconds
    #[arg(long, env = "SEARCH_POLL_REQUEST_TIMEOUT_MS")]
    request_timeout_ms: Option<u64>,

    /// Print every intermediate fragment to stderr
    #[arg(long, default_value_t = false)]
    progress: bool,
}

impl Cli {
    fn poll_config(&self) -> PollConfig {
        PollConfig {
            readiness_interval: Duration::from_millis(self.readiness_interval_ms),
            result_interval: Duration::from_millis(self.result_interval_ms),
            max_readiness_polls: self.max_readiness_polls,
            max_result_polls: self.max_result_polls,
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Submit one search and print the final HTML fragment.
    Search {
        /// Keywords to search for.
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// Ask once whether the search index is ready.
    Ready,
    /// Read one query per line; each new line replaces the running search.
    Interactive,
}

/// Shows region updates on the terminal.
struct TerminalRegion {
    progress: bool,
}

impl ContentRegion for TerminalRegion {
    fn replace(&self, html: &str) {
        debug!(html = %html, "content region updated");
        if self.progress {
            eprintln!("{html}");
        }
    }
}

type Poller = SearchPoller<HttpSearchBackend, TerminalRegion>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.poll_config();

    let backend = HttpSearchBackend::new(&cli.base_url)?;
    info!(
        version = app_version,
        base_url = %backend.base_url(),
        started_at = %Utc::now().to_rfc3339(),
        "search-poll boot"
    );

    match cli.command {
        Command::Ready => {
            let ready = match config.request_timeout {
                Some(limit) => tokio::time::timeout(limit, backend.index_ready())
                    .await
                    .unwrap_or(Err(PollError::Timeout(limit)))?,
                None => backend.index_ready().await?,
            };
            println!("{ready}");
        }
        Command::Search { keywords } => {
            let query = keywords.join(" ");
            let poller = Arc::new(
                SearchPoller::new(backend, TerminalRegion { progress: cli.progress })
                    .with_config(config),
            );
            run_single(&poller, &query).await?;
        }
        Command::Interactive => {
            let poller = Arc::new(
                SearchPoller::new(backend, TerminalRegion { progress: cli.progress })
                    .with_config(config),
            );
            run_interactive(&poller).await?;
        }
    }

    Ok(())
}

async fn run_single(poller: &Arc<Poller>, query: &str) -> anyhow::Result<()> {
    let Some(task) = poller.spawn_search(query) else {
        println!("nothing to search for");
        return Ok(());
    };

    let join = task.join();
    tokio::pin!(join);

    let result = tokio::select! {
        result = &mut join => result,
        _ = tokio::signal::ctrl_c() => {
            poller.cancel();
            join.await
        }
    };

    match result {
        Ok(outcome) => {
            println!("{}", outcome.html);
            info!(
                query = %outcome.query,
                readiness_polls = outcome.readiness_polls,
                result_polls = outcome.result_polls,
                elapsed_ms = (outcome.finished_at - outcome.started_at).num_milliseconds(),
                "search complete"
            );
            Ok(())
        }
        Err(PollError::Cancelled) => {
            warn!(query = %query, "search interrupted");
            Ok(())
        }
        Err(error) => Err(anyhow::anyhow!(error.to_string())),
    }
}

async fn run_interactive(poller: &Arc<Poller>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut running = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match poller.spawn_search(&line) {
                    Some(task) => running = Some(tokio::spawn(report(task))),
                    None => debug!("blank line skipped"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                poller.cancel();
                break;
            }
        }
    }

    if let Some(reporter) = running {
        reporter.await?;
    }
    Ok(())
}

async fn report(task: SearchTask) {
    let query = task.query().to_string();
    match task.join().await {
        Ok(outcome) => println!("{}", outcome.html),
        Err(PollError::Cancelled) => info!(query = %query, "search replaced or cancelled"),
        Err(error) => error!(query = %query, error = %error, "search failed"),
    }
}
