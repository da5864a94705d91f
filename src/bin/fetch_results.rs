use clap::Parser;
use color_eyre::eyre::eyre;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use svviz_view::client::{ClientEvent, HttpBackend, PollOutcome, PollingClient};
use svviz_view::config::Config;
use svviz_view::snapshot::Snapshot;
use tokio::sync::mpsc;

const DEFAULT_OUTPUT: &str = "svviz-snapshot.ron";

/// Waits for an svviz backend to finish rendering and saves everything it serves.
#[derive(Parser, Debug)]
#[command(name = "fetch_results", version)]
struct Args {
    /// Base URL of the svviz backend (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    /// Where to write the RON snapshot
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Delay between status polls in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = Config::load(None)?;
    config.override_with(args.server, args.poll_interval_ms);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Waiting for {}", config.server));

    let backend = HttpBackend::new(&config.server, config.request_timeout())?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let waker_spinner = spinner.clone();
    let client = PollingClient::new(backend, config.categories.clone(), tx, move || {
        waker_spinner.tick();
    });

    let interval = config.poll_interval();
    let poller = tokio::spawn(async move { client.poll_until_ready(interval).await });

    let mut snapshot = Snapshot::new(config.server.clone());
    let mut failures = Vec::new();

    // The channel closes once the poller and its loader tasks are done.
    while let Some(event) = rx.recv().await {
        match event {
            ClientEvent::Progress { attempt, state } => {
                spinner.set_message(format!("Backend is {state} (poll {attempt})"));
            }
            ClientEvent::Fragments {
                category,
                fragments,
            } => {
                spinner.println(format!(
                    "Fetched {} {} fragments",
                    fragments.len(),
                    category.label()
                ));
                snapshot.fragments.insert(category, fragments);
            }
            ClientEvent::Counts(counts) => {
                spinner.println(format!("Fetched counts for {} rows", counts.len()));
                snapshot.counts = counts;
            }
            ClientEvent::Failed { what, message } => {
                spinner.println(format!("Failed to fetch {what}: {message}"));
                failures.push(what);
            }
            ClientEvent::Detail { .. } | ClientEvent::PdfExport(_) => {}
        }
    }

    match poller.await? {
        PollOutcome::Ready { attempts } => {
            spinner.finish_with_message(format!("Backend ready after {attempts} polls"));
        }
        PollOutcome::Cancelled => {
            spinner.abandon_with_message("Polling cancelled");
            return Err(eyre!("polling was cancelled before results were loaded"));
        }
    }

    if snapshot.fragments.is_empty() {
        return Err(eyre!("no categories could be fetched from {}", config.server));
    }

    snapshot.save(&args.output)?;
    println!(
        "Wrote {} fragments to {}",
        snapshot.fragment_count(),
        args.output.display()
    );

    if !failures.is_empty() {
        println!("Missing: {}", failures.join(", "));
    }

    Ok(())
}
