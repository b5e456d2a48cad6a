use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use warp::path::Tail;
use warp::{Filter, Rejection, Reply};

use crate::web::rejections::handle_rejection;
use crate::AppData;

pub mod listings;
pub mod rejections;
pub mod wishlist;

pub async fn create_task(addr: SocketAddr, data: Arc<AppData>, mut shutdown: watch::Receiver<bool>) -> impl Future<Output=()> {
    let routes = routes(data).with(warp::trace::request());

    warp::serve(routes).bind_with_graceful_shutdown(addr, async move { let _ = shutdown.changed().await; }).1
}

pub fn routes(data: Arc<AppData>) -> impl Filter<Extract=impl Reply, Error=Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "DELETE"])
        .allow_headers(vec!["content-type"]);

    listings::filter(data.clone())
        .or(wishlist::filter(data))
        .recover(handle_rejection)
        .with(cors)
}

/// Matches the end of the path, with or without a trailing slash.
fn end() -> impl Filter<Extract=(), Error=Rejection> + Clone {
    warp::path::tail().and_then(|tail: Tail| async move {
        if tail.as_str().is_empty() {
            Ok(())
        } else {
            Err(warp::reject::not_found())
        }
    }).untuple_one()
}


#[derive(Debug, Serialize)]
pub struct JsonMessage {
    message: &'static str,
}

pub fn json_message(message: &'static str) -> warp::reply::Json {
    warp::reply::json(&JsonMessage { message })
}

pub fn with_data(data: Arc<AppData>) -> impl Filter<Extract=(Arc<AppData>, ), Error=Infallible> + Clone {
    warp::any().map(move || data.clone())
}
