use std::env::var;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::*;

use crate::media::{ImageFile, MediaError, MediaStore};

/// Cloudinary upload api client, authenticated with signed requests.
pub struct Cloudinary {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UploadResponse {
    Uploaded { secure_url: String },
    Failed { error: UploadFailure },
}

#[derive(Deserialize)]
struct UploadFailure {
    message: String,
}

#[instrument(name = "media_init")]
pub fn init() -> Result<Cloudinary, MediaError> {
    let cloud_name = var("CLOUDINARY_CLOUD_NAME")?;
    let api_key = var("CLOUDINARY_API_KEY")?;
    let api_secret = var("CLOUDINARY_API_SECRET")?;

    Ok(Cloudinary {
        client: Client::new(),
        cloud_name,
        api_key,
        api_secret,
    })
}

impl Cloudinary {
    fn upload_url(&self) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/image/upload", self.cloud_name)
    }
}

#[async_trait]
impl MediaStore for Cloudinary {
    #[instrument(skip(self, image), fields(file = ?image.file_name, size = image.bytes.len()), level = "debug")]
    async fn upload(&self, image: ImageFile) -> Result<String, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&[("timestamp", timestamp.as_str())], &self.api_secret);

        let file = Part::bytes(image.bytes).file_name(image.file_name.unwrap_or("upload".to_string()));
        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .part("file", file);

        let response = self.client.post(self.upload_url()).multipart(form).send().await?;
        match response.json::<UploadResponse>().await? {
            UploadResponse::Uploaded { secure_url } => {
                debug!("Uploaded image to {}", secure_url);
                Ok(secure_url)
            }
            UploadResponse::Failed { error } => Err(MediaError::Provider(error.message)),
        }
    }
}

/// Request signature: parameters sorted by name, joined as a query string,
/// suffixed with the api secret and hashed with SHA-1.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by_key(|(name, _)| *name);
    let joined = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("&");
    format!("{:x}", Sha1::digest(format!("{}{}", joined, secret).as_bytes()))
}
