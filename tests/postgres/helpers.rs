//! Shared helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use pg_embedded_setup_unpriv::TestCluster;
use tasktrace::config::DatabaseConfig;
use tasktrace::task::adapters::postgres::{PostgresStore, TASK_SCHEMA_SQL};
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "tasktrace_test_template";

/// Creates a tokio runtime for async store calls in tests.
///
/// # Errors
///
/// Returns an error when the runtime cannot be built.
pub fn test_runtime() -> eyre::Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Ensures the template database exists with the task schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(TASK_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("schema SQL failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| eyre::eyre!("template setup failed: {e}"))
}

/// Per-test database cloned from the template and dropped afterwards.
pub struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
}

impl TestDatabase {
    /// Creates a fresh database from the migrated template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template or the database cannot be created.
    pub fn from_template(cluster: &'static TestCluster) -> eyre::Result<Self> {
        ensure_template(cluster)?;
        let name = format!("tasktrace_test_{}", Uuid::new_v4().simple());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .map_err(|e| eyre::eyre!("create database {name}: {e}"))?;
        Ok(Self { cluster, name })
    }

    /// Connects a store to this database.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot connect.
    pub fn store(&self) -> eyre::Result<PostgresStore> {
        let config = DatabaseConfig {
            url: self.cluster.connection().database_url(&self.name),
            max_connections: 2,
        };
        Ok(PostgresStore::connect(&config)?)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.name.as_str()) {
            tracing::warn!(database = %self.name, error = %err, "failed to drop test database");
        }
    }
}
