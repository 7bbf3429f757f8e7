//! Query dispatch: from parsed queries to text-protocol responses.

use std::sync::Arc;

use tracing::debug;

use keva_common::types::CommandKind;
use keva_storage::{Storage, StorageError};

use crate::query::{self, QueryError};

/// Response for a successful mutation.
const OK: &str = "[ok]";

/// Response for a lookup of an absent key.
const NOT_FOUND: &str = "[not found]";

/// Dispatches parsed queries to storage and renders responses.
pub struct Database {
    storage: Arc<Storage>,
}

impl Database {
    /// Creates a database over the given storage.
    #[must_use]
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Handles one query line and returns the textual response.
    ///
    /// Never fails: every error becomes a protocol response, so one bad query
    /// cannot take a connection down.
    pub async fn handle_query(&self, input: &str) -> String {
        debug!(query = input, "handling query");

        let query = match query::parse(input) {
            Ok(query) => query,
            Err(err) => return render_parse_error(&err),
        };

        let result = match query.command {
            CommandKind::Set => self
                .storage
                .set(&query.args[0], &query.args[1])
                .await
                .map(|()| OK.to_string()),
            CommandKind::Get => self.storage.get(&query.args[0]),
            CommandKind::Del => self
                .storage
                .del(&query.args[0])
                .await
                .map(|()| OK.to_string()),
        };

        match result {
            Ok(response) => response,
            Err(err) => render_storage_error(&err),
        }
    }
}

fn render_parse_error(err: &QueryError) -> String {
    format!("[error] {err}")
}

fn render_storage_error(err: &StorageError) -> String {
    match err {
        StorageError::KeyNotFound { .. } => NOT_FOUND.to_string(),
        other => format!("[error] {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keva_engine::{Engine, MemoryEngine};
    use keva_storage::Storage;
    use tokio::sync::mpsc;

    fn plain_database() -> Database {
        let engine: Arc<dyn Engine> = Arc::new(MemoryEngine::new());
        Database::new(Storage::builder(engine).build().unwrap())
    }

    #[tokio::test]
    async fn test_set_get_del_roundtrip() {
        let database = plain_database();

        assert_eq!(database.handle_query("SET a 1").await, "[ok]");
        assert_eq!(database.handle_query("GET a").await, "1");
        assert_eq!(database.handle_query("DEL a").await, "[ok]");
        assert_eq!(database.handle_query("GET a").await, "[not found]");
        assert_eq!(database.handle_query("GET never-set").await, "[not found]");
    }

    #[tokio::test]
    async fn test_parse_errors_are_responses() {
        let database = plain_database();

        let response = database.handle_query("NOPE a").await;
        assert!(response.starts_with("[error]"), "got {response}");

        let response = database.handle_query("SET a").await;
        assert!(response.starts_with("[error]"), "got {response}");
    }

    #[tokio::test]
    async fn test_replica_rejection_is_distinct() {
        let engine: Arc<dyn Engine> = Arc::new(MemoryEngine::new());
        let (_feed_tx, feed_rx) = mpsc::channel(1);
        let storage = Storage::builder(engine).replica_feed(feed_rx).build().unwrap();
        let database = Database::new(storage);

        let response = database.handle_query("SET a 1").await;
        assert_eq!(
            response,
            "[error] write operations are not allowed on a replica"
        );
        assert_ne!(response, "[ok]");
        assert_ne!(response, "[not found]");

        // The engine stays untouched.
        assert_eq!(database.handle_query("GET a").await, "[not found]");
    }
}
