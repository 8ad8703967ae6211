//! Profile fetch demo
//!
//! Tracks a simulated profile lookup through every lifecycle path: a fetch
//! that succeeds, one that fails, a reset, a `Load` ignored while another is
//! in flight, and a completion dropped because its owner went away.
//!
//! ```bash
//! RUST_LOG=profile_fetch=debug,async_tracker_runtime=trace cargo run -p profile-fetch
//! ```

use async_tracker_core::AsyncState;
use async_tracker_core::environment::{LivenessFlag, TrackerEnvironment};
use async_tracker_runtime::metrics::MetricsExporter;
use async_tracker_runtime::{OperationTracker, Production, TrackerOptions};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LATENCY: Duration = Duration::from_millis(25);
const WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Profile {
    id: u32,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum FetchError {
    NotFound { id: u32 },
}

type ProfileState = AsyncState<Profile, FetchError, u32>;

/// Simulated lookup against a tiny in-memory directory
async fn fetch_profile(id: u32) -> Result<Profile, FetchError> {
    tokio::time::sleep(LATENCY).await;
    let name = match id {
        1 => "Ada",
        2 => "Grace",
        3 => "Barbara",
        _ => return Err(FetchError::NotFound { id }),
    };
    Ok(Profile {
        id,
        name: name.to_string(),
    })
}

fn producer(state: &ProfileState) -> Production<Profile, FetchError> {
    let id = state.context().copied().unwrap_or_default();
    Production::deferred(fetch_profile(id))
}

fn options() -> TrackerOptions<Profile, FetchError, u32> {
    TrackerOptions::<Profile, FetchError, u32>::new()
        .on_load(|state| tracing::info!(id = ?state.context(), "Fetching profile"))
        .on_success(|state| {
            if let Some(profile) = state.data() {
                tracing::info!(id = profile.id, name = %profile.name, "Profile loaded");
            }
        })
        .on_error(|state| tracing::warn!(error = ?state.error(), "Profile fetch failed"))
}

fn print_snapshot(label: &str, state: &ProfileState) -> anyhow::Result<()> {
    println!("{label:<28} {}", serde_json::to_string(state)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_fetch=debug,async_tracker_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut exporter = MetricsExporter::new();
    exporter.install()?;

    println!("=== Profile Fetch: Operation Tracker ===\n");

    let owner = LivenessFlag::new();
    let tracker = OperationTracker::with_environment(
        producer,
        options(),
        TrackerEnvironment::default().with_liveness(owner.clone()),
    );
    print_snapshot("initial", &tracker.snapshot().await)?;

    let state = tracker.load_and_wait(1, WAIT).await?;
    print_snapshot("load(1)", &state)?;

    let state = tracker.load_and_wait(42, WAIT).await?;
    print_snapshot("load(42)", &state)?;

    tracker.reset().await?;
    print_snapshot("reset", &tracker.snapshot().await)?;

    // The second Load arrives while the first is in flight and is ignored
    let mut handle = tracker.load(2).await?;
    tracker.load(3).await?;
    print_snapshot("load(2) + load(3)", &tracker.snapshot().await)?;
    handle.wait().await;
    print_snapshot("settled", &tracker.snapshot().await)?;

    // Owner goes away mid-flight; the result is discarded
    let mut handle = tracker.load(3).await?;
    owner.teardown();
    handle.wait().await;
    print_snapshot("owner gone before settle", &tracker.snapshot().await)?;
    tracker.teardown();

    println!(
        "\ntransitions: {}, torn down: {}",
        tracker.generation().await,
        tracker.is_torn_down()
    );

    if let Some(rendered) = exporter.render() {
        println!("\n=== Metrics ===\n{rendered}");
    }

    Ok(())
}
