use crate::api::CatalogApi;
use crate::config::Config;
use crate::db::CatalogStorage;
use crate::error::CatalogError;
use crate::service::canonicalize::canonicalize_file;
use crate::service::export::export_to_file;
use crate::service::fetch::fetch_make_list;
use crate::service::sync::{SyncOrchestrator, SyncReport, load_make_list};
use crate::types::catalog::RemoteMake;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// A named pipeline step, or the whole `sync -> export -> canonicalize` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    Fetch,
    Sync,
    Export,
    Canonicalize,
    #[default]
    All,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fetch" => Ok(Self::Fetch),
            "sync" => Ok(Self::Sync),
            "export" => Ok(Self::Export),
            "canonicalize" | "sort" => Ok(Self::Canonicalize),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown command `{other}`; expected fetch, sync, export, canonicalize or all"
            )),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fetch => "fetch",
            Self::Sync => "sync",
            Self::Export => "export",
            Self::Canonicalize => "canonicalize",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

/// What a pipeline invocation did.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub fetched: Option<usize>,
    pub sync: Option<SyncReport>,
    pub exported_makes: Option<usize>,
}

/// Run `command` against the configured remote catalog, store and artifacts.
pub async fn run(command: Command, cfg: &Config) -> Result<PipelineOutcome, CatalogError> {
    info!(%command, "starting pipeline");
    let mut outcome = PipelineOutcome::default();

    match command {
        Command::Fetch => {
            let api = CatalogApi::new(cfg)?;
            outcome.fetched = Some(fetch_make_list(&api, &cfg.makes_path).await?);
        }
        Command::Canonicalize => {
            canonicalize_file(&cfg.export_path)?;
        }
        Command::Sync | Command::Export | Command::All => {
            // checked before the store is touched so nothing is created
            let makes = match command {
                Command::Export => None,
                _ => Some(load_make_list(&cfg.makes_path)?),
            };

            let store = match command {
                // export only reads: a missing store must not be recreated empty
                Command::Export => CatalogStorage::open_existing(&cfg.database_url).await?,
                _ => CatalogStorage::connect(&cfg.database_url).await?,
            };
            let result = with_store(command, cfg, &store, makes, &mut outcome).await;
            store.close().await;
            result?;

            if command == Command::All {
                canonicalize_file(&cfg.export_path)?;
            }
        }
    }

    info!(%command, "pipeline finished");
    Ok(outcome)
}

async fn with_store(
    command: Command,
    cfg: &Config,
    store: &CatalogStorage,
    makes: Option<Vec<RemoteMake>>,
    outcome: &mut PipelineOutcome,
) -> Result<(), CatalogError> {
    if let Some(makes) = makes {
        let api = CatalogApi::new(cfg)?;
        let report = SyncOrchestrator::new(store, &api, cfg.request_delay())
            .run(&makes)
            .await;
        let (make_count, model_count) = store.counts().await?;
        info!(makes = make_count, models = model_count, "store totals");
        outcome.sync = Some(report);
    }

    if command != Command::Sync {
        let doc = export_to_file(store, &cfg.export_path).await?;
        outcome.exported_makes = Some(doc.makes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("sync".parse::<Command>(), Ok(Command::Sync));
        assert_eq!("Canonicalize".parse::<Command>(), Ok(Command::Canonicalize));
        assert_eq!("sort".parse::<Command>(), Ok(Command::Canonicalize));
        assert!("deploy".parse::<Command>().is_err());
        assert_eq!(Command::default(), Command::All);
        assert_eq!(Command::Export.to_string(), "export");
    }

    #[tokio::test]
    async fn missing_make_list_aborts_before_creating_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cars.db");
        let cfg = Config {
            database_url: format!("sqlite:{}", db.display()),
            makes_path: dir.path().join("makes.json"),
            export_path: dir.path().join("cars.json"),
            ..Config::default()
        };

        let err = run(Command::All, &cfg).await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingMakeList(_)));
        assert!(!db.exists());
        assert!(!cfg.export_path.exists());
    }
}
