//! Walk through the store's operations against the repository named by
//! `IFLOW_DATABASE` (default `.iflow`), printing results as JSON.
//!
//! Logging is controlled with `RUST_LOG`.

use iflow_core::{Artifact, ArtifactResponse, ArtifactType, ArtifactUpdate};
use iflow_storage::{ArtifactStore, StoreConfig, StoreError, VersionedStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("iflow_storage=debug,info"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if let Err(err) = run() {
        tracing::error!(error = %err, "Demo failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env();
    tracing::info!(root = %config.root.display(), "Opening artifact store");
    let store = VersionedStore::open(config)?;

    let mut login = Artifact::new(ArtifactType::requirement(), "User Login")?
        .with_description("Users must be able to log in with email and password")
        .with_category("auth");
    store.save(&mut login)?;

    let mut task = Artifact::new(ArtifactType::task(), "Implement login form")?
        .with_description("Form with validation and error display");
    store.save(&mut task)?;

    let mut bug = Artifact::new(ArtifactType::bug(), "Password field shows plain text")?;
    store.save(&mut bug)?;

    task.update(ArtifactUpdate {
        status: Some("in_progress".to_string()),
        ..Default::default()
    })?;
    store.update(&mut task)?;

    print_json("artifacts", &responses(store.list(None)?))?;
    print_json("search: login", &responses(store.search("login")?))?;
    print_json("history", &store.history(task.id().as_str())?)?;
    print_json("stats", &store.stats()?)?;

    match store.delete("99999") {
        Err(StoreError::NotFound { id }) => tracing::info!(artifact_id = %id, "Nothing to delete"),
        other => other?,
    }

    Ok(())
}

fn responses(artifacts: Vec<Artifact>) -> Vec<ArtifactResponse> {
    artifacts.into_iter().map(ArtifactResponse::from).collect()
}

fn print_json<T: serde::Serialize>(label: &str, value: &T) -> Result<(), serde_json::Error> {
    println!("== {} ==", label);
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
