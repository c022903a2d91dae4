use crate::api::CatalogSource;
use crate::db::CatalogStorage;
use crate::error::CatalogError;
use crate::types::catalog::{Envelope, MakeAttributes, RemoteMake};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Load the previously fetched make list (`{"data": [{"id", "attributes": {"make"}}]}`).
pub fn load_make_list(path: &Path) -> Result<Vec<RemoteMake>, CatalogError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CatalogError::MissingMakeList(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let envelope: Envelope<MakeAttributes> = serde_json::from_str(&contents)?;
    Ok(envelope.into_makes())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeFailure {
    pub make: String,
    pub error: String,
}

/// Outcome of one sync pass. `processed + skipped` equals the input length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub processed: usize,
    pub skipped: usize,
    pub failures: Vec<MakeFailure>,
}

/// Drives one sequential pass over a make list, merging each make's models
/// into the store.
pub struct SyncOrchestrator<'a, S> {
    store: &'a CatalogStorage,
    source: &'a S,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl<'a, S: CatalogSource> SyncOrchestrator<'a, S> {
    /// `request_delay` is the minimum spacing between model requests; zero
    /// disables pacing.
    pub fn new(store: &'a CatalogStorage, source: &'a S, request_delay: Duration) -> Self {
        let limiter = Quota::with_period(request_delay).map(RateLimiter::direct);
        Self {
            store,
            source,
            limiter,
        }
    }

    /// Never aborts on a single make: failures are logged, recorded in the
    /// report, and the pass moves on.
    pub async fn run(&self, makes: &[RemoteMake]) -> SyncReport {
        info!(count = makes.len(), "resyncing makes");
        let mut report = SyncReport::default();

        for make in makes {
            if let Some(limiter) = self.limiter.as_ref() {
                limiter.until_ready().await;
            }

            match self.sync_make(make).await {
                Ok(count) => {
                    info!(make = %make.name, make_id = make.id, count, "synced models");
                    report.processed += 1;
                }
                Err(e) => {
                    warn!(make = %make.name, make_id = make.id, error = %e, "skipping make");
                    report.skipped += 1;
                    report.failures.push(MakeFailure {
                        make: make.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            "sync pass complete"
        );
        report
    }

    async fn sync_make(&self, make: &RemoteMake) -> Result<usize, CatalogError> {
        let make_id = self.store.upsert_make(make.id, &make.name).await?;
        info!(make = %make.name, "fetching models");
        let models = self.source.list_models(&make.name).await?;
        self.store.upsert_models(make_id, &models).await?;
        Ok(models.len())
    }
}
