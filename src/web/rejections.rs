use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use warp::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{InvalidHeader, InvalidQuery, LengthRequired, MethodNotAllowed, MissingHeader, PayloadTooLarge, Reject, UnsupportedMediaType};
use warp::reply::{json, with_status, Response};
use warp::{Rejection, Reply};

use crate::database::DatabaseError;
use crate::media::MediaError;

pub async fn handle_rejection(err: Rejection) -> Result<Response, Rejection> {
    if err.is_not_found() {
        Ok(error_response("Not found", StatusCode::NOT_FOUND))
    } else if let Some(e) = err.find::<ApiError>() {
        e.log_if_needed();
        Ok(e.as_response())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        debug!("Rejected request body : {}", e);
        Ok(error_response(&e.to_string(), StatusCode::BAD_REQUEST))
    } else if err.find::<MethodNotAllowed>().is_some() {
        Ok(error_response("Method not allowed", StatusCode::METHOD_NOT_ALLOWED))
    } else if let Some(e) = err.find::<UnsupportedMediaType>() {
        Ok(error_response(&e.to_string(), StatusCode::UNSUPPORTED_MEDIA_TYPE))
    } else if let Some(e) = err.find::<PayloadTooLarge>() {
        Ok(error_response(&e.to_string(), StatusCode::PAYLOAD_TOO_LARGE))
    } else if let Some(e) = err.find::<LengthRequired>() {
        Ok(error_response(&e.to_string(), StatusCode::LENGTH_REQUIRED))
    } else if let Some(e) = err.find::<InvalidHeader>() {
        Ok(error_response(&e.to_string(), StatusCode::BAD_REQUEST))
    } else if let Some(e) = err.find::<MissingHeader>() {
        Ok(error_response(&e.to_string(), StatusCode::BAD_REQUEST))
    } else if let Some(e) = err.find::<InvalidQuery>() {
        Ok(error_response(&e.to_string(), StatusCode::BAD_REQUEST))
    } else {
        debug!("Unhandled rejection : {:?}", err);
        Ok(error_response("Bad request", StatusCode::BAD_REQUEST))
    }
}


#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Could not upload image : {0}")]
    Upload(#[from] MediaError),
    #[error("Could not store data : {0}")]
    Storage(DatabaseError),
    #[error("{0}")]
    Query(DatabaseError),
}


impl Reject for ApiError {}

#[derive(Debug, Serialize)]
struct JsonError<'a> {
    error: &'a str,
}

fn error_response(message: &str, status: StatusCode) -> Response {
    with_status(json(&JsonError { error: message }), status).into_response()
}

impl ApiError {
    pub fn as_response(&self) -> Response {
        match self {
            ApiError::Validation(_) => error_response(&self.to_string(), StatusCode::BAD_REQUEST),
            _ => error_response(&self.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
    pub fn log_if_needed(&self) {
        match self {
            ApiError::Validation(_) => debug!("{}", self),
            _ => error!("{}", self),
        }
    }
}
