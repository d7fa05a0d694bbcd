//! Product photo management.
//!
//! [`PhotoGallery`] drives one product's photo list through a
//! [`PhotoService`]. The production service is [`ApiClient`]; tests swap in
//! an in-memory implementation.

pub mod gallery;
pub mod upload;

pub use gallery::{Direction, PhotoGallery};
pub use upload::{ALLOWED_CONTENT_TYPES, PhotoUpload, UploadError};

use std::future::Future;

use shopfloor_core::{PhotoId, ProductId};

use crate::api::{ApiClient, ApiError, Photo, SyncReport};

/// Remote operations on a product's photos.
pub trait PhotoService {
    fn list_photos(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Vec<Photo>, ApiError>> + Send;

    fn upload_photo(
        &self,
        product_id: ProductId,
        upload: &PhotoUpload,
    ) -> impl Future<Output = Result<Photo, ApiError>> + Send;

    fn delete_photo(
        &self,
        product_id: ProductId,
        photo_id: PhotoId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn reorder_photos(
        &self,
        product_id: ProductId,
        photo_ids: &[PhotoId],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn set_primary_photo(
        &self,
        product_id: ProductId,
        photo_id: PhotoId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn sync_photos(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<SyncReport, ApiError>> + Send;
}

impl PhotoService for ApiClient {
    async fn list_photos(&self, product_id: ProductId) -> Result<Vec<Photo>, ApiError> {
        Self::list_photos(self, product_id).await
    }

    async fn upload_photo(
        &self,
        product_id: ProductId,
        upload: &PhotoUpload,
    ) -> Result<Photo, ApiError> {
        Self::upload_photo(self, product_id, upload).await
    }

    async fn delete_photo(&self, product_id: ProductId, photo_id: PhotoId) -> Result<(), ApiError> {
        Self::delete_photo(self, product_id, photo_id).await
    }

    async fn reorder_photos(
        &self,
        product_id: ProductId,
        photo_ids: &[PhotoId],
    ) -> Result<(), ApiError> {
        Self::reorder_photos(self, product_id, photo_ids).await
    }

    async fn set_primary_photo(
        &self,
        product_id: ProductId,
        photo_id: PhotoId,
    ) -> Result<(), ApiError> {
        Self::set_primary_photo(self, product_id, photo_id).await
    }

    async fn sync_photos(&self, product_id: ProductId) -> Result<SyncReport, ApiError> {
        Self::sync_photos(self, product_id).await
    }
}
