//! Product photo operations.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::instrument;

use shopfloor_core::{PhotoId, ProductId};

use super::{
    ApiClient, ApiError,
    types::{DataEnvelope, Photo, SyncReport},
};
use crate::photos::PhotoUpload;

/// Body of the reorder request.
#[derive(Debug, Serialize)]
struct ReorderBody<'a> {
    photo_ids: &'a [PhotoId],
}

impl ApiClient {
    /// List a product's photos.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn list_photos(&self, product_id: ProductId) -> Result<Vec<Photo>, ApiError> {
        let url = self.endpoint(&format!("products/{product_id}/photos"))?;
        let envelope: DataEnvelope<Vec<Photo>> =
            Self::send_json(self.request(Method::GET, url)).await?;
        Ok(envelope.data)
    }

    /// Upload a photo as multipart form data (field `photo`).
    ///
    /// New photos start in the temporary state until synced.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the remote service rejects the file.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name(), size = upload.len()))]
    pub async fn upload_photo(
        &self,
        product_id: ProductId,
        upload: &PhotoUpload,
    ) -> Result<Photo, ApiError> {
        let url = self.endpoint(&format!("products/{product_id}/photos"))?;

        let part = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.content_type())?;
        let form = Form::new().part("photo", part);

        let envelope: DataEnvelope<Photo> =
            Self::send_json(self.request(Method::POST, url).multipart(form)).await?;

        tracing::info!(photo_id = %envelope.data.id, "Photo uploaded");
        Ok(envelope.data)
    }

    /// Delete a photo.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the photo is already gone.
    #[instrument(skip(self))]
    pub async fn delete_photo(
        &self,
        product_id: ProductId,
        photo_id: PhotoId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("products/{product_id}/photos/{photo_id}"))?;
        Self::send_empty(self.request(Method::DELETE, url)).await
    }

    /// Persist a new display order. `photo_ids` lists every photo, first to last.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the ids do not match the product's photos.
    #[instrument(skip(self))]
    pub async fn reorder_photos(
        &self,
        product_id: ProductId,
        photo_ids: &[PhotoId],
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("products/{product_id}/photos/order"))?;
        Self::send_empty(
            self.request(Method::PUT, url)
                .json(&ReorderBody { photo_ids }),
        )
        .await
    }

    /// Mark a photo as the product's primary image.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the photo does not exist.
    #[instrument(skip(self))]
    pub async fn set_primary_photo(
        &self,
        product_id: ProductId,
        photo_id: PhotoId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("products/{product_id}/photos/{photo_id}/primary"))?;
        Self::send_empty(self.request(Method::POST, url)).await
    }

    /// Push temporary photos to the external commerce platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote service cannot reach the platform.
    #[instrument(skip(self))]
    pub async fn sync_photos(&self, product_id: ProductId) -> Result<SyncReport, ApiError> {
        let url = self.endpoint(&format!("products/{product_id}/photos/sync"))?;
        let envelope: DataEnvelope<SyncReport> =
            Self::send_json(self.request(Method::POST, url)).await?;

        tracing::info!(synced = envelope.data.synced, "Photos synced to platform");
        Ok(envelope.data)
    }
}
