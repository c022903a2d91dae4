use crate::db::models::{DbMake, DbModel};
use crate::db::schema::SQLITE_INIT;
use crate::error::CatalogError;
use crate::types::catalog::RemoteModel;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::str::FromStr;
use tracing::{debug, warn};

type SqlitePool = Pool<Sqlite>;

/// Durable cache of the remote catalog. One run owns it exclusively.
#[derive(Clone)]
pub struct CatalogStorage {
    pool: SqlitePool,
}

impl CatalogStorage {
    /// Open (creating if missing) the database and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let storage = Self {
            pool: open_pool(connect_opts).await?,
        };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    /// Open an existing database read-only. Never creates a file or a table,
    /// so a wrong `database_url` fails here or on the first read.
    pub async fn open_existing(database_url: &str) -> Result<Self, CatalogError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(false)
            .read_only(true);
        Ok(Self {
            pool: open_pool(connect_opts).await?,
        })
    }

    /// Create tables if absent; safe to call on every run.
    pub async fn ensure_schema(&self) -> Result<(), CatalogError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert the make unless its id is already stored. Returns the id that
    /// models of this make must reference.
    ///
    /// When the name is already taken by a row with a different id, nothing is
    /// inserted and the existing row's id is returned.
    pub async fn upsert_make(&self, id: i64, name: &str) -> Result<i64, CatalogError> {
        sqlx::query("INSERT OR IGNORE INTO makes (id, make) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        let by_id: Option<(i64,)> = sqlx::query_as("SELECT id FROM makes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        if let Some((effective,)) = by_id {
            return Ok(effective);
        }

        let (effective,): (i64,) = sqlx::query_as("SELECT id FROM makes WHERE make = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        warn!(
            make = %name,
            remote_id = id,
            stored_id = effective,
            "make name already stored under another id; reusing stored id"
        );
        Ok(effective)
    }

    /// Insert the model unless its id is already stored. Fails with
    /// [`CatalogError::UnknownMake`] and leaves the store untouched when
    /// `make_id` is not a stored make.
    pub async fn upsert_model(&self, id: i64, make_id: i64, name: &str) -> Result<(), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        insert_model(&mut *conn, id, make_id, name).await
    }

    /// Upsert one make's model batch in a single transaction and commit it.
    /// On error nothing from the batch is kept.
    pub async fn upsert_models(
        &self,
        make_id: i64,
        models: &[RemoteModel],
    ) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;
        for model in models {
            insert_model(&mut *tx, model.id, make_id, &model.name).await?;
        }
        tx.commit().await?;
        debug!(make_id, count = models.len(), "committed model batch");
        Ok(())
    }

    pub async fn all_makes_ordered_by_name(&self) -> Result<Vec<DbMake>, CatalogError> {
        let rows = sqlx::query_as::<_, DbMake>("SELECT id, make FROM makes ORDER BY make, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn models_for_make(&self, make_id: i64) -> Result<Vec<DbModel>, CatalogError> {
        let rows = sqlx::query_as::<_, DbModel>(
            "SELECT id, make_id, model FROM models WHERE make_id = ? ORDER BY model, id",
        )
        .bind(make_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Number of stored `(makes, models)`.
    pub async fn counts(&self) -> Result<(i64, i64), CatalogError> {
        let (makes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM makes")
            .fetch_one(&self.pool)
            .await?;
        let (models,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM models")
            .fetch_one(&self.pool)
            .await?;
        Ok((makes, models))
    }

    /// Flush and release the underlying connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn open_pool(connect_opts: SqliteConnectOptions) -> Result<SqlitePool, CatalogError> {
    // A single connection keeps `sqlite::memory:` coherent and writes serialized.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_opts)
        .await?;
    Ok(pool)
}

async fn insert_model(
    conn: &mut SqliteConnection,
    id: i64,
    make_id: i64,
    name: &str,
) -> Result<(), CatalogError> {
    let make: Option<(i64,)> = sqlx::query_as("SELECT id FROM makes WHERE id = ?")
        .bind(make_id)
        .fetch_optional(&mut *conn)
        .await?;
    if make.is_none() {
        return Err(CatalogError::UnknownMake {
            model_id: id,
            make_id,
        });
    }

    sqlx::query("INSERT OR IGNORE INTO models (id, make_id, model) VALUES (?, ?, ?)")
        .bind(id)
        .bind(make_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> CatalogStorage {
        CatalogStorage::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn ensure_schema_is_repeatable() {
        let store = memory_store().await;
        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
        assert_eq!(store.counts().await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn upsert_make_twice_is_a_noop() {
        let store = memory_store().await;
        assert_eq!(store.upsert_make(1, "Honda").await.unwrap(), 1);
        assert_eq!(store.upsert_make(1, "Honda").await.unwrap(), 1);
        let makes = store.all_makes_ordered_by_name().await.unwrap();
        assert_eq!(
            makes,
            vec![DbMake {
                id: 1,
                name: "Honda".into()
            }]
        );
    }

    #[tokio::test]
    async fn upsert_make_does_not_overwrite() {
        let store = memory_store().await;
        store.upsert_make(1, "Honda").await.unwrap();
        assert_eq!(store.upsert_make(1, "Honda Motor").await.unwrap(), 1);
        let makes = store.all_makes_ordered_by_name().await.unwrap();
        assert_eq!(makes[0].name, "Honda");
    }

    #[tokio::test]
    async fn upsert_make_with_taken_name_returns_stored_id() {
        let store = memory_store().await;
        store.upsert_make(1, "Honda").await.unwrap();
        assert_eq!(store.upsert_make(5, "Honda").await.unwrap(), 1);
        assert_eq!(store.counts().await.unwrap(), (1, 0));
    }

    #[tokio::test]
    async fn upsert_model_twice_is_a_noop() {
        let store = memory_store().await;
        store.upsert_make(1, "Honda").await.unwrap();
        store.upsert_model(10, 1, "Civic").await.unwrap();
        store.upsert_model(10, 1, "Civic").await.unwrap();
        let models = store.models_for_make(1).await.unwrap();
        assert_eq!(
            models,
            vec![DbModel {
                id: 10,
                make_id: 1,
                name: "Civic".into()
            }]
        );
    }

    #[tokio::test]
    async fn model_with_unknown_make_is_rejected() {
        let store = memory_store().await;
        store.upsert_make(1, "Honda").await.unwrap();
        store.upsert_model(10, 1, "Civic").await.unwrap();

        let err = store.upsert_model(11, 99, "Ghost").await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnknownMake {
                model_id: 11,
                make_id: 99
            }
        ));
        assert_eq!(store.counts().await.unwrap(), (1, 1));
        assert!(store.models_for_make(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_batch_is_rolled_back() {
        let store = memory_store().await;
        let models = vec![
            RemoteModel {
                id: 10,
                name: "Civic".into(),
            },
            RemoteModel {
                id: 11,
                name: "Accord".into(),
            },
        ];
        assert!(store.upsert_models(42, &models).await.is_err());
        assert_eq!(store.counts().await.unwrap(), (0, 0));

        store.upsert_make(42, "Honda").await.unwrap();
        store.upsert_models(42, &models).await.unwrap();
        assert_eq!(store.counts().await.unwrap(), (1, 2));
    }

    #[tokio::test]
    async fn reads_are_ordered_by_stored_name() {
        let store = memory_store().await;
        store.upsert_make(1, "Honda").await.unwrap();
        store.upsert_make(2, "acura").await.unwrap();
        store.upsert_make(3, "BMW").await.unwrap();
        store.upsert_model(10, 1, "civic Type R").await.unwrap();
        store.upsert_model(11, 1, "Accord").await.unwrap();
        store.upsert_model(12, 1, "Civic").await.unwrap();

        let names: Vec<_> = store
            .all_makes_ordered_by_name()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        // byte order: upper case sorts first
        assert_eq!(names, vec!["BMW", "Honda", "acura"]);

        let models: Vec<_> = store
            .models_for_make(1)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(models, vec!["Accord", "Civic", "civic Type R"]);
    }

    #[tokio::test]
    async fn data_survives_reopening_a_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("cars.db").display());

        let store = CatalogStorage::connect(&url).await.unwrap();
        store.upsert_make(1, "Honda").await.unwrap();
        store
            .upsert_models(
                1,
                &[RemoteModel {
                    id: 10,
                    name: "Civic".into(),
                }],
            )
            .await
            .unwrap();
        store.close().await;

        let reopened = CatalogStorage::connect(&url).await.unwrap();
        assert_eq!(reopened.counts().await.unwrap(), (1, 1));
        reopened.close().await;
    }

    #[tokio::test]
    async fn open_existing_refuses_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.db");
        let url = format!("sqlite:{}", path.display());

        assert!(CatalogStorage::open_existing(&url).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn open_existing_reads_but_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("cars.db").display());
        let store = CatalogStorage::connect(&url).await.unwrap();
        store.upsert_make(1, "Honda").await.unwrap();
        store.close().await;

        let readonly = CatalogStorage::open_existing(&url).await.unwrap();
        assert_eq!(readonly.all_makes_ordered_by_name().await.unwrap().len(), 1);
        assert!(readonly.upsert_make(2, "acura").await.is_err());
        assert_eq!(readonly.counts().await.unwrap(), (1, 0));
        readonly.close().await;
    }

    #[tokio::test]
    async fn file_without_tables_fails_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        std::fs::write(&path, b"").unwrap();
        let url = format!("sqlite:{}", path.display());

        let store = CatalogStorage::open_existing(&url).await.unwrap();
        assert!(store.all_makes_ordered_by_name().await.is_err());
        store.close().await;
    }
}
