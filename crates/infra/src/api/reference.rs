//! Reference-data client for the initial bootstrap sync.

use std::sync::Arc;

use async_trait::async_trait;
use fieldsync_core::{ProgressSink, ReferenceDataClient, SyncError};
use fieldsync_domain::{CodeTable, Result as DomainResult, BOOTSTRAP_CODE_TABLES};
use reqwest::Method;
use tracing::{debug, instrument};

use super::client::ApiClient;
use crate::database::SqliteCodeTableRepository;

/// Fetches the bootstrap code tables from the remote authority and persists
/// them locally.
pub struct CodeTableClient {
    api: Arc<ApiClient>,
    repo: Arc<SqliteCodeTableRepository>,
}

impl CodeTableClient {
    pub fn new(api: Arc<ApiClient>, repo: Arc<SqliteCodeTableRepository>) -> Self {
        Self { api, repo }
    }

    async fn fetch_table(&self, name: &str) -> Result<CodeTable, SyncError> {
        let builder = self.api.request(Method::GET, &format!("/codes/{name}"));
        let response = self.api.send(builder).await.map_err(|err| match err {
            SyncError::Unauthenticated => SyncError::Unauthenticated,
            other => SyncError::Bootstrap(format!("{name}: {other}")),
        })?;
        let items: Vec<String> = response
            .json()
            .await
            .map_err(|e| SyncError::Bootstrap(format!("{name}: invalid response: {e}")))?;
        Ok(CodeTable::new(name, items))
    }
}

#[async_trait]
impl ReferenceDataClient for CodeTableClient {
    async fn is_populated(&self) -> DomainResult<bool> {
        self.repo.is_populated().await
    }

    #[instrument(skip(self, progress))]
    async fn fetch_bootstrap_tables(&self, progress: &dyn ProgressSink) -> Result<(), SyncError> {
        for name in BOOTSTRAP_CODE_TABLES {
            progress.report(&format!("Fetching {name}"));
            let table = self.fetch_table(name).await?;
            debug!(table = %name, items = table.items.len(), "Code table fetched");
            self.repo
                .save_table(&table)
                .await
                .map_err(|e| SyncError::Bootstrap(format!("{name}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::auth::SessionTokenStore;
    use super::super::client::ApiClientConfig;
    use super::*;
    use crate::database::DbManager;

    #[derive(Default)]
    struct VecProgress(Mutex<Vec<String>>);

    impl ProgressSink for VecProgress {
        fn report(&self, message: &str) {
            self.0.lock().push(message.to_string());
        }
    }

    async fn setup(server: &MockServer) -> (CodeTableClient, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let manager = DbManager::new(temp_dir.path().join("test.db"), 4).expect("manager");
        manager.run_migrations().expect("migrations");
        let repo = Arc::new(SqliteCodeTableRepository::new(Arc::new(manager)));

        let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        let api = ApiClient::new(config, Arc::new(SessionTokenStore::new())).expect("client");

        (CodeTableClient::new(Arc::new(api), repo), temp_dir)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetches_every_bootstrap_table_and_persists() {
        let server = MockServer::start().await;
        for name in BOOTSTRAP_CODE_TABLES {
            Mock::given(method("GET"))
                .and(path(format!("/codes/{name}")))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!(["Alpha", "Beta"])),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let (client, _dir) = setup(&server).await;
        let progress = VecProgress::default();

        assert!(!client.is_populated().await.expect("empty at start"));
        client.fetch_bootstrap_tables(&progress).await.expect("fetch succeeds");

        assert!(client.is_populated().await.expect("populated"));
        let messages = progress.0.lock().clone();
        assert_eq!(messages.len(), BOOTSTRAP_CODE_TABLES.len());
        assert!(messages[0].starts_with("Fetching"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn one_failed_table_fails_the_bootstrap() {
        let server = MockServer::start().await;
        // First table succeeds, the rest are unmocked and return 404.
        Mock::given(method("GET"))
            .and(path(format!("/codes/{}", BOOTSTRAP_CODE_TABLES[0])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Alpha"])))
            .mount(&server)
            .await;

        let (client, _dir) = setup(&server).await;
        let progress = VecProgress::default();

        let result = client.fetch_bootstrap_tables(&progress).await;
        assert!(matches!(result, Err(SyncError::Bootstrap(_))));
        assert!(!client.is_populated().await.expect("still empty"));
    }
}
