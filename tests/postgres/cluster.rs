//! Embedded `PostgreSQL` cluster shared by every test in this binary.
//!
//! The cluster is bootstrapped once per process through
//! [`shared_cluster_handle`]. Each test gets its own database cloned from a
//! template that already carries the ledger schema, so tests never see each
//! other's rows.
//!
//! Setting `SKIP_TEST_CLUSTER=1` turns cluster bootstrap failures into
//! skipped tests instead of panics.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use diesel::connection::SimpleConnection;
use diesel::{Connection, PgConnection};
use eyre::WrapErr;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use pg_embedded_setup_unpriv::{ClusterHandle, ExecutionPrivileges, detect_execution_privileges};

pub use pg_embedded_setup_unpriv::TemporaryDatabase;

/// Ledger schema applied to the template database.
pub const MIGRATION_UP: &str =
    include_str!("../../migrations/2026-10-19-000000_create_ledger_tables/up.sql");

const SKIP_ENV: &str = "SKIP_TEST_CLUSTER";
const WORKER_ENV: &str = "PG_EMBEDDED_WORKER";
const TEMPLATE_PREFIX: &str = "questbank_template";

static TEMPLATE_LOCK: Mutex<()> = Mutex::new(());
static DATABASE_SEQUENCE: AtomicUsize = AtomicUsize::new(0);
static WORKER: OnceLock<Result<(), String>> = OnceLock::new();

/// Returns true when `SKIP_TEST_CLUSTER` is set to `1`, `true` or `yes`.
#[must_use]
pub fn should_skip_test_cluster() -> bool {
    std::env::var(SKIP_ENV)
        .is_ok_and(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Reports a cluster bootstrap failure.
///
/// Returns `None` when skipping is enabled so the caller can bail out.
///
/// # Panics
///
/// Panics when skipping is not enabled, so CI never hides a broken cluster.
#[expect(clippy::print_stderr, reason = "skip marker must reach the test log")]
pub fn handle_cluster_setup_failure<T>(reason: &dyn Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set {SKIP_ENV}=1 to skip.");
    }
}

/// Creates an empty database holding the ledger schema.
///
/// # Errors
///
/// Returns an error when the cluster cannot start or the database cannot be
/// cloned from the template.
pub fn create_test_database() -> eyre::Result<TemporaryDatabase> {
    ensure_worker_configured()?;
    let cluster = shared_cluster_handle()
        .map_err(|err| eyre::eyre!("bootstrap shared cluster: {err}"))?;
    let template = ensure_template(cluster)?;
    let name = format!(
        "questbank_{pid}_{seq}",
        pid = std::process::id(),
        seq = DATABASE_SEQUENCE.fetch_add(1, Ordering::Relaxed),
    );
    cluster
        .temporary_database_from_template(name.as_str(), template.as_str())
        .map_err(|err| eyre::eyre!("clone {template} into {name}: {err}"))
}

fn template_name() -> String {
    let mut hasher = DefaultHasher::new();
    MIGRATION_UP.hash(&mut hasher);
    format!("{TEMPLATE_PREFIX}_{:016x}", hasher.finish())
}

fn ensure_template(cluster: &ClusterHandle) -> eyre::Result<String> {
    let template = template_name();
    let _guard = TEMPLATE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let exists = cluster
        .database_exists(template.as_str())
        .map_err(|err| eyre::eyre!("check template {template}: {err}"))?;
    if !exists {
        cluster
            .create_database(template.as_str())
            .map_err(|err| eyre::eyre!("create template {template}: {err}"))?;
        let url = cluster.connection().database_url(&template);
        let mut connection = PgConnection::establish(&url).wrap_err("connect to template")?;
        connection
            .batch_execute(MIGRATION_UP)
            .wrap_err("apply ledger schema to template")?;
    }
    Ok(template)
}

/// Points the cluster at this package's `pg_worker` when running as root.
fn ensure_worker_configured() -> eyre::Result<()> {
    WORKER
        .get_or_init(|| configure_worker().map_err(|err| format!("{err:#}")))
        .clone()
        .map_err(|err| eyre::eyre!(err))
}

fn configure_worker() -> eyre::Result<()> {
    if !matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        || std::env::var_os(WORKER_ENV).is_some()
    {
        return Ok(());
    }

    // The build directory is usually unreadable for `nobody`.
    let source = PathBuf::from(env!("CARGO_BIN_EXE_pg_worker"));
    let destination =
        std::env::temp_dir().join(format!("questbank_pg_worker_{}", std::process::id()));
    std::fs::copy(&source, &destination)
        .wrap_err_with(|| format!("copy {} to {}", source.display(), destination.display()))?;
    std::fs::set_permissions(&destination, std::fs::Permissions::from_mode(0o755))
        .wrap_err("make pg_worker executable")?;

    // SAFETY: runs once, before the shared cluster bootstraps and reads it.
    unsafe { std::env::set_var(WORKER_ENV, &destination) };
    Ok(())
}
