use std::env::var;
use std::future::Future;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use futures::join;
use tokio::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::*;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::database::Store;
use crate::media::MediaStore;

mod database;
mod media;
mod structures;
mod web;
#[cfg(test)]
mod testing;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logs();
    info!("Starting estate-listings");

    let db = Arc::new(database::init().await?);
    let media = Arc::new(media::init()?);

    let (shutdown_task, r) = shutdown();

    let data = Arc::new(AppData {
        db,
        media,
    });

    let addr = SocketAddr::from_str(&var("LISTINGS_ADDRESS").unwrap_or("127.0.0.1:5000".to_string()))?;
    info!("Listening on {}", addr);
    let web_task = web::create_task(addr, data, r).await;

    join!(shutdown_task, web_task);

    Ok(())
}

pub struct AppData {
    pub db: Arc<dyn Store>,
    pub media: Arc<dyn MediaStore>,
}

fn init_logs() {
    tracing_subscriber::fmt()
        .with_env_filter(var("LOG_LEVEL").unwrap_or("sqlx=warn,reqwest=info,hyper=info,warp=info,tokio=info,info".to_string()))
        .with_span_events(FmtSpan::CLOSE).init();
}

fn shutdown() -> (impl Future, watch::Receiver<bool>) {
    let (s, r) = watch::channel(false);
    (shutdown_task(s), r)
}

async fn shutdown_task(s: watch::Sender<bool>) {
    let mut signal = match signal::unix::signal(SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(err) => {
            error!("Could not listen for SIGTERM : {}", err);
            let _ = signal::ctrl_c().await;
            s.send_replace(true);
            return;
        }
    };
    tokio::select! {
        _ = signal.recv() => {
            info!("Shutdown signal received");
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown requested");
        },
    }

    s.send_replace(true);
}
