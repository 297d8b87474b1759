//! SQLite-backed storage for bootstrap reference tables.

use std::sync::Arc;

use fieldsync_domain::{CodeTable, Result as DomainResult, BOOTSTRAP_CODE_TABLES};
use rusqlite::params;
use tokio::task;
use tracing::debug;

use super::manager::DbManager;
use crate::errors::InfraError;

/// Repository for the reference tables fetched by the initial sync.
pub struct SqliteCodeTableRepository {
    db: Arc<DbManager>,
}

impl SqliteCodeTableRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Persist one fetched table, replacing any previous copy.
    pub async fn save_table(&self, table: &CodeTable) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let to_save = table.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let items_json = serde_json::to_string(&to_save.items).map_err(InfraError::from)?;
            conn.execute(
                "INSERT OR REPLACE INTO code_tables (name, items_json, fetched_at)
                 VALUES (?1, ?2, CAST(strftime('%s','now') AS INTEGER))",
                params![to_save.name, items_json],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
        .map_err(InfraError::from)??;

        debug!(table = %table.name, items = table.items.len(), "Code table saved");
        Ok(())
    }

    /// Fetch one table by name.
    pub async fn table(&self, name: &str) -> DomainResult<Option<CodeTable>> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<CodeTable>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT items_json FROM code_tables WHERE name = ?1")
                .map_err(InfraError::from)?;
            let mut rows = stmt
                .query_map(params![name], |row| row.get::<_, String>(0))
                .map_err(InfraError::from)?;
            match rows.next() {
                Some(row) => {
                    let items_json = row.map_err(InfraError::from)?;
                    let items: Vec<String> =
                        serde_json::from_str(&items_json).map_err(InfraError::from)?;
                    Ok(Some(CodeTable { name, items }))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(InfraError::from)?
    }

    /// Whether every bootstrap table has been fetched at least once.
    pub async fn is_populated(&self) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            let placeholders =
                BOOTSTRAP_CODE_TABLES.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            let sql = format!(
                "SELECT COUNT(DISTINCT name) FROM code_tables WHERE name IN ({placeholders})"
            );
            let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
            let count: i64 = stmt
                .query_row(rusqlite::params_from_iter(BOOTSTRAP_CODE_TABLES.iter()), |row| {
                    row.get(0)
                })
                .map_err(InfraError::from)?;
            Ok(count as usize == BOOTSTRAP_CODE_TABLES.len())
        })
        .await
        .map_err(InfraError::from)?
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn setup_repository() -> (SqliteCodeTableRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("manager created");
        manager.run_migrations().expect("migrations applied");
        let repo = SqliteCodeTableRepository::new(Arc::new(manager));

        (repo, temp_dir)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_and_read_back_table() {
        let (repo, _dir) = setup_repository().await;
        let table =
            CodeTable::new("stations", vec!["Golden".to_string(), "Radium".to_string()]);

        repo.save_table(&table).await.expect("save succeeds");

        let loaded = repo.table("stations").await.expect("read succeeds").expect("found");
        assert_eq!(loaded.items, vec!["Golden", "Radium"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn populated_only_when_all_bootstrap_tables_present() {
        let (repo, _dir) = setup_repository().await;
        assert!(!repo.is_populated().await.expect("empty check"));

        // All but one
        for name in &BOOTSTRAP_CODE_TABLES[..BOOTSTRAP_CODE_TABLES.len() - 1] {
            repo.save_table(&CodeTable::new(*name, vec!["x".to_string()]))
                .await
                .expect("save");
        }
        assert!(!repo.is_populated().await.expect("partial check"));

        let last = BOOTSTRAP_CODE_TABLES[BOOTSTRAP_CODE_TABLES.len() - 1];
        repo.save_table(&CodeTable::new(last, vec!["x".to_string()])).await.expect("save");
        assert!(repo.is_populated().await.expect("full check"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_table_returns_none() {
        let (repo, _dir) = setup_repository().await;
        assert!(repo.table("waterbodies").await.expect("read succeeds").is_none());
    }
}
