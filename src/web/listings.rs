use std::sync::Arc;

use futures::{pin_mut, TryStreamExt};
use serde::Serialize;
use tracing::*;
use warp::multipart::{FormData, Part};
use warp::{path, reply, Buf, Filter, Rejection, Reply};

use crate::media::ImageFile;
use crate::structures::listings::{project_listings, ImageSlots, ListingPayload, IMAGE_SLOTS};
use crate::web::rejections::ApiError;
use crate::web::{end, with_data};
use crate::AppData;

const MAX_FORM_SIZE: u64 = 50 * 1024 * 1024;

pub fn filter(data: Arc<AppData>) -> impl Filter<Extract=impl Reply, Error=Rejection> + Clone {
    path!("api"/"v1"/"storepost"/..).and(end()).and(warp::post()).and(with_data(data.clone())).and(warp::multipart::form().max_length(MAX_FORM_SIZE)).and_then(store_post)
        .or(path!("api"/"v1"/"retrievedata"/..).and(end()).and(warp::get()).and(with_data(data)).and_then(retrieve_data))
}

/// A listing submission once the multipart form has been read.
#[derive(Debug)]
struct Submission {
    listing: ListingPayload,
    images: Vec<ImageFile>,
}

#[derive(Debug, Serialize)]
struct StoredListing {
    message: &'static str,
    property_name: String,
    image_urls: ImageSlots,
}

#[instrument(skip(data, form))]
async fn store_post(data: Arc<AppData>, form: FormData) -> Result<impl Reply, Rejection> {
    let submission = read_submission(form).await?;
    let stored = ingest(&data, submission).await?;
    Ok(reply::json(&stored))
}

async fn read_submission(form: FormData) -> Result<Submission, ApiError> {
    pin_mut!(form);

    let mut listing = None;
    let mut images = Vec::new();

    while let Some(part) = form.try_next().await.map_err(|e| ApiError::Validation(format!("Malformed form : {}", e)))? {
        let name = part.name().to_string();
        match name.as_str() {
            "data" => {
                let bytes = read_part(part).await?;
                listing = Some(serde_json::from_slice::<ListingPayload>(&bytes).map_err(|e| ApiError::Validation(format!("Invalid listing data : {}", e)))?);
            }
            "images" => {
                let file_name = part.filename().map(str::to_string);
                images.push(ImageFile { file_name, bytes: read_part(part).await? });
            }
            other => debug!("Ignoring form field {}", other),
        }
    }

    match listing {
        None => Err(ApiError::Validation("Missing form field : data".to_string())),
        Some(listing) => Ok(Submission { listing, images }),
    }
}

async fn read_part(part: Part) -> Result<Vec<u8>, ApiError> {
    part.stream().try_fold(Vec::new(), |mut bytes, chunk| async move {
        bytes.extend_from_slice(chunk.chunk());
        Ok(bytes)
    }).await.map_err(|e| ApiError::Validation(format!("Could not read form field : {}", e)))
}

/// Uploads the first five images then stores the listing.
///
/// Uploads are not undone when storing fails.
async fn ingest(data: &AppData, submission: Submission) -> Result<StoredListing, ApiError> {
    let Submission { listing, images } = submission;

    if images.len() > IMAGE_SLOTS {
        warn!("Ignoring {} images beyond the first {} for {}", images.len() - IMAGE_SLOTS, IMAGE_SLOTS, listing.property_name);
    }

    let mut urls = Vec::with_capacity(IMAGE_SLOTS);
    for image in images.into_iter().take(IMAGE_SLOTS) {
        urls.push(data.media.upload(image).await?);
    }
    let image_urls = ImageSlots::new(urls);

    data.db.insert_listing(&listing, &image_urls).await.map_err(ApiError::Storage)?;
    info!("Property {} inserted", listing.property_name);

    Ok(StoredListing {
        message: "Data received!",
        property_name: listing.property_name,
        image_urls,
    })
}

#[instrument(skip(data))]
async fn retrieve_data(data: Arc<AppData>) -> Result<impl Reply, Rejection> {
    let properties = data.db.select_properties().await.map_err(ApiError::Query)?;
    let images = data.db.select_property_images().await.map_err(ApiError::Query)?;
    let listings = project_listings(properties, images);
    debug!("Projected {} listings", listings.as_slice().len());
    Ok(reply::json(&listings))
}
