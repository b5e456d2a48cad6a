use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::*;
use warp::body::json;
use warp::{path, reply, Filter, Rejection, Reply};

use crate::structures::listings::project_favorites;
use crate::web::rejections::ApiError;
use crate::web::{end, json_message, with_data};
use crate::AppData;

pub fn filter(data: Arc<AppData>) -> impl Filter<Extract=impl Reply, Error=Rejection> + Clone {
    path!("api"/"v1"/"addtowishlist"/..).and(end()).and(warp::post()).and(with_data(data.clone())).and(json::<WishlistEntry>()).and_then(add_to_wishlist)
        .or(path!("api"/"v1"/"retrievefavorites"/..).and(end()).and(warp::get()).and(with_data(data.clone())).and(warp::query::<HashMap<String, String>>()).and_then(retrieve_favorites))
        .or(path!("api"/"v1"/"removefromwishlist"/..).and(end()).and(warp::delete()).and(with_data(data)).and(warp::query::<HashMap<String, String>>()).and_then(remove_from_wishlist))
}

#[derive(Debug, Deserialize)]
struct WishlistEntry {
    user_name: String,
    wishlist_property: String,
}

/// Query parameter value, absent when missing or empty.
fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str).filter(|value| !value.is_empty())
}

#[instrument(skip(data))]
async fn add_to_wishlist(data: Arc<AppData>, entry: WishlistEntry) -> Result<impl Reply, Rejection> {
    data.db.insert_wishlist(&entry.user_name, &entry.wishlist_property).await.map_err(ApiError::Storage)?;
    Ok(json_message("Wishlist entry added successfully!"))
}

#[instrument(skip(data))]
async fn retrieve_favorites(data: Arc<AppData>, params: HashMap<String, String>) -> Result<impl Reply, Rejection> {
    let user_name = param(&params, "username").ok_or_else(|| ApiError::Validation("Username not provided".to_string()))?;

    let favorites = data.db.select_favorites(user_name).await.map_err(ApiError::Query)?;
    Ok(reply::json(&project_favorites(favorites)))
}

#[instrument(skip(data))]
async fn remove_from_wishlist(data: Arc<AppData>, params: HashMap<String, String>) -> Result<impl Reply, Rejection> {
    let (user_name, property_name) = match (param(&params, "username"), param(&params, "property_name")) {
        (Some(user_name), Some(property_name)) => (user_name, property_name),
        _ => return Err(ApiError::Validation("Invalid input".to_string()).into()),
    };

    let removed = data.db.delete_wishlist(user_name, property_name).await.map_err(ApiError::Storage)?;
    debug!("Removed {} wishlist entries", removed);
    Ok(json_message("Wishlist item removed successfully!"))
}
