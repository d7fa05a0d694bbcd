//! Photo gallery for one product.
//!
//! Every mutating call is followed by a refetch, so the list always mirrors
//! what the remote service holds, including after a failed mutation.

use shopfloor_core::{PhotoId, ProductId};
use tracing::instrument;

use super::{PhotoService, PhotoUpload};
use crate::api::{ApiError, Photo};
use crate::models::Notice;

/// Direction for single-step reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

pub struct PhotoGallery<S> {
    service: S,
    product_id: ProductId,
    photos: Vec<Photo>,
}

impl<S: PhotoService> PhotoGallery<S> {
    /// Create an empty gallery. Call [`refresh`](Self::refresh) to load it.
    pub const fn new(service: S, product_id: ProductId) -> Self {
        Self {
            service,
            product_id,
            photos: Vec::new(),
        }
    }

    /// Create a gallery and load its photos.
    ///
    /// # Errors
    ///
    /// Returns the API error if the initial listing fails.
    pub async fn load(service: S, product_id: ProductId) -> Result<Self, ApiError> {
        let mut gallery = Self::new(service, product_id);
        gallery.refresh().await?;
        Ok(gallery)
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Photos in display order.
    #[must_use]
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// The product's primary photo, if one is set.
    #[must_use]
    pub fn primary(&self) -> Option<&Photo> {
        self.photos.iter().find(|p| p.is_primary)
    }

    /// Number of photos not yet on the commerce platform.
    #[must_use]
    pub fn pending_sync(&self) -> usize {
        self.photos.iter().filter(|p| !p.status.is_synced()).count()
    }

    /// Reload the list from the remote service.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous list is kept.
    #[instrument(skip(self), fields(product_id = %self.product_id))]
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let mut photos = self.service.list_photos(self.product_id).await?;
        photos.sort_by_key(|p| p.position);
        self.photos = photos;
        Ok(())
    }

    pub async fn upload(&mut self, upload: PhotoUpload) -> Notice {
        let result = self.service.upload_photo(self.product_id, &upload).await;
        let notice = match result {
            Ok(photo) => Notice::success(format!("Uploaded {}.", photo.name)),
            Err(e) => failure("Upload failed", &e),
        };
        self.settle(notice).await
    }

    pub async fn delete(&mut self, photo_id: PhotoId) -> Notice {
        let result = self.service.delete_photo(self.product_id, photo_id).await;
        let notice = match result {
            Ok(()) => Notice::success("Photo deleted."),
            Err(e) => failure("Could not delete the photo", &e),
        };
        self.settle(notice).await
    }

    pub async fn set_primary(&mut self, photo_id: PhotoId) -> Notice {
        let result = self
            .service
            .set_primary_photo(self.product_id, photo_id)
            .await;
        let notice = match result {
            Ok(()) => Notice::success("Primary photo updated."),
            Err(e) => failure("Could not set the primary photo", &e),
        };
        self.settle(notice).await
    }

    /// Persist a full ordering, first to last.
    ///
    /// An ordering that is not a permutation of the loaded photos is
    /// rejected without contacting the server.
    pub async fn reorder(&mut self, order: &[PhotoId]) -> Notice {
        if !self.is_permutation(order) {
            return Notice::error("The photo order is out of date. Reload and try again.");
        }
        let result = self.service.reorder_photos(self.product_id, order).await;
        let notice = match result {
            Ok(()) => Notice::success("Photo order saved."),
            Err(e) => failure("Could not save the photo order", &e),
        };
        self.settle(notice).await
    }

    /// Move one photo a single step. Moving past either end is a no-op.
    pub async fn move_photo(&mut self, photo_id: PhotoId, direction: Direction) -> Notice {
        let Some(order) = self.order_after_move(photo_id, direction) else {
            return Notice::error("That photo is no longer in the gallery.");
        };
        if order == self.ids() {
            return Notice::success("Photo order unchanged.");
        }
        self.reorder(&order).await
    }

    /// Push temporary photos to the commerce platform.
    pub async fn sync(&mut self) -> Notice {
        if self.pending_sync() == 0 {
            return Notice::success("All photos are already synced.");
        }
        let result = self.service.sync_photos(self.product_id).await;
        let notice = match result {
            Ok(report) => Notice::success(format!("Synced {} photo(s).", report.synced)),
            Err(e) => failure("Sync failed", &e),
        };
        self.settle(notice).await
    }

    /// Refetch after a mutation. A failed refetch turns the notice into an error.
    async fn settle(&mut self, notice: Notice) -> Notice {
        match self.refresh().await {
            Ok(()) => notice,
            Err(e) => {
                tracing::warn!(error = %e, "Photo list refresh failed after mutation");
                let mut message = notice.message;
                message.push_str(" The photo list could not be refreshed.");
                Notice::error(message)
            }
        }
    }

    fn ids(&self) -> Vec<PhotoId> {
        self.photos.iter().map(|p| p.id).collect()
    }

    fn is_permutation(&self, order: &[PhotoId]) -> bool {
        let mut current = self.ids();
        let mut proposed = order.to_vec();
        current.sort_unstable();
        proposed.sort_unstable();
        current == proposed
    }

    fn order_after_move(&self, photo_id: PhotoId, direction: Direction) -> Option<Vec<PhotoId>> {
        let mut order = self.ids();
        let index = order.iter().position(|id| *id == photo_id)?;
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|i| *i < order.len()),
        };
        if let Some(target) = target {
            order.swap(index, target);
        }
        Some(order)
    }
}

fn failure(action: &str, error: &ApiError) -> Notice {
    tracing::warn!(error = %error, "{action}");
    Notice::error(format!("{action}: {}", error.user_message()))
}
