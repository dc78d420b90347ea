//! Test helpers: logging setup and service directory fixtures

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Install a global tracing subscriber once per test binary.
///
/// Honors `RUST_LOG`, defaulting to `debug` for this crate.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pgsetup=debug"));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_test_writer()
                .with_filter(env_filter),
        );

        if tracing::dispatcher::has_been_set() {
            return;
        }
        if let Err(e) = subscriber.try_init() {
            eprintln!("Error: Failed to set up logging: {}", e);
        }
        info!("Test Setup complete");
    });
}

/// Create `<root>/<dir>` with an optional `config.yaml` and `.env`.
pub fn create_service_dir(
    root: &Path,
    dir: &str,
    config_yaml: Option<&str>,
    dot_env: Option<&str>,
) -> PathBuf {
    let path = root.join(dir);
    fs::create_dir_all(&path).expect("create service dir");
    if let Some(content) = config_yaml {
        fs::write(path.join("config.yaml"), content).expect("write config.yaml");
    }
    if let Some(content) = dot_env {
        fs::write(path.join(".env"), content).expect("write .env");
    }
    path
}

/// `config.yaml` content for a service with the given database and user.
pub fn service_config(name: &str, database: &str, user: &str) -> String {
    format!("service:\n  name: {name}\ndatabase:\n  name: {database}\n  user: {user}\n")
}
