use cardle_sync::service::pipeline::{self, Command};
use mimalloc::MiMalloc;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cfg = &cardle_sync::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let command = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<Command>() {
            Ok(c) => c,
            Err(e) => {
                error!("{e}");
                return ExitCode::from(2);
            }
        },
        None => Command::default(),
    };

    info!(
        database_url = %cfg.database_url,
        makes_path = %cfg.makes_path.display(),
        export_path = %cfg.export_path.display(),
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
    );

    match pipeline::run(command, cfg).await {
        Ok(outcome) => {
            if let Some(report) = outcome.sync.as_ref() {
                for failure in &report.failures {
                    warn!(make = %failure.make, error = %failure.error, "make needs a re-run");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%command, error = %e, "pipeline failed");
            ExitCode::FAILURE
        }
    }
}
