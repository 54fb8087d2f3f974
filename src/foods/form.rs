use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// File sent in the `image` part of a multipart food form.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Food add/edit body: either JSON, or `multipart/form-data` whose text parts
/// carry the same fields and whose `image` part may be a file.
#[derive(Debug)]
pub struct FoodForm<T> {
    pub fields: T,
    pub upload: Option<ImageUpload>,
}

#[async_trait]
impl<S, T> FromRequest<S> for FoodForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(fields) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Ok(Self {
                fields,
                upload: None,
            });
        }

        let mut mp = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let mut text = Map::new();
        let mut upload = None;
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_owned();
                    let body = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    // browsers send an empty file part when nothing was picked
                    if name == "image" && !body.is_empty() {
                        upload = Some(ImageUpload {
                            file_name,
                            content_type,
                            body,
                        });
                    }
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    text.insert(name, Value::String(value));
                }
            }
        }

        let fields = serde_json::from_value(Value::Object(text))
            .map_err(|e| ApiError::BadRequest(format!("Invalid form: {e}")))?;
        Ok(Self { fields, upload })
    }
}
