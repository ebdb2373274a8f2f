//! Cue light controller host binary.

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use cuelight_core::{NullStore, Peripherals, Store, bootstrap};
use cuelight_server::{
    AppState, Args, Exit, RedbStore, Runtime, ServerError, SystemEnv,
    board::{LogDisplay, VirtualBoard},
    radio::HostRadio,
    router,
};
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "fatal");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let store: Arc<dyn Store> = match RedbStore::open(&args.db_path) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            warn!(%error, "persistence unavailable, running without it");
            Arc::new(NullStore)
        },
    };
    let env = SystemEnv;
    let mut radio = HostRadio::new(args.station_unreachable);

    loop {
        let network =
            bootstrap::run(args.bootstrap_config(), &env, &mut radio, store.as_ref()).await;

        let peripherals =
            Peripherals::new(VirtualBoard::new(args.channels), LogDisplay, Arc::clone(&store));
        let (runtime, handle, requests) = Runtime::new(
            env,
            args.cue_config(),
            network,
            peripherals,
            args.poll_interval(),
        );
        let controller = tokio::spawn(runtime.run(requests));

        let (exit_tx, mut exit_rx) = watch::channel(None);
        let ctrl_c = exit_tx.clone();
        let signals = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c.send_replace(Some(Exit::Shutdown));
            }
        });

        let listener = TcpListener::bind(args.bind)
            .await
            .map_err(|source| ServerError::Bind { addr: args.bind, source })?;
        info!(addr = %args.bind, mode = ?network.mode, ip = %network.ip, "serving");

        let app = router(AppState::new(handle, Arc::clone(&store), exit_tx));
        let mut shutdown = exit_rx.clone();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(Option::is_some).await;
            })
            .await;

        signals.abort();
        controller.abort();
        served?;

        let exit = *exit_rx.borrow_and_update();
        match exit {
            Some(Exit::Restart) => info!("restarting"),
            Some(Exit::Shutdown) | None => {
                info!("shutting down");
                return Ok(());
            },
        }
    }
}
