//! Product photo gallery route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfloor_core::{PhotoId, ProductId};

use super::flash;
use crate::api::{ApiClient, Photo};
use crate::error::AppError;
use crate::filters;
use crate::models::{Notice, session::take_notices};
use crate::photos::{ALLOWED_CONTENT_TYPES, Direction, PhotoGallery, PhotoUpload, UploadError};
use crate::state::AppState;

/// Multipart field carrying the file.
const UPLOAD_FIELD: &str = "photo";

/// Photo card for templates.
#[derive(Debug, Clone)]
pub struct PhotoView {
    pub id: PhotoId,
    pub url: String,
    pub name: String,
    pub is_primary: bool,
    pub status: String,
    pub synced: bool,
    pub first: bool,
    pub last: bool,
}

impl PhotoView {
    fn list(photos: &[Photo]) -> Vec<Self> {
        let last = photos.len().saturating_sub(1);
        photos
            .iter()
            .enumerate()
            .map(|(index, photo)| Self {
                id: photo.id,
                url: photo.url.clone(),
                name: photo.name.clone(),
                is_primary: photo.is_primary,
                status: photo.status.label().to_string(),
                synced: photo.status.is_synced(),
                first: index == 0,
                last: index == last,
            })
            .collect()
    }
}

/// Photo gallery page template.
#[derive(Template, WebTemplate)]
#[template(path = "photos/index.html")]
pub struct PhotosIndexTemplate {
    pub current_path: String,
    pub notices: Vec<Notice>,
    pub product_id: ProductId,
    pub photos: Vec<PhotoView>,
    /// Current order as submitted by the reorder form, e.g. `3,1,2`.
    pub order: String,
    pub pending_sync: usize,
    pub max_upload_bytes: usize,
    pub accept: String,
}

impl PhotosIndexTemplate {
    fn new(gallery: &PhotoGallery<ApiClient>, notices: Vec<Notice>, max_upload_bytes: usize) -> Self {
        let product_id = gallery.product_id();
        Self {
            current_path: gallery_path(product_id),
            notices,
            product_id,
            photos: PhotoView::list(gallery.photos()),
            order: format_order(gallery.photos().iter().map(|p| p.id)),
            pending_sync: gallery.pending_sync(),
            max_upload_bytes,
            accept: ALLOWED_CONTENT_TYPES.join(","),
        }
    }
}

fn gallery_path(product_id: ProductId) -> String {
    format!("/products/{product_id}/photos")
}

fn back(product_id: ProductId) -> Redirect {
    Redirect::to(&gallery_path(product_id))
}

fn format_order(ids: impl Iterator<Item = PhotoId>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

/// Parse a comma-separated photo order such as `3,1,2`.
fn parse_order(raw: &str) -> Option<Vec<PhotoId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<PhotoId>().ok())
        .collect()
}

/// Load the gallery for an action, or explain why it could not be loaded.
async fn load_gallery(
    state: &AppState,
    product_id: ProductId,
) -> Result<PhotoGallery<ApiClient>, Notice> {
    PhotoGallery::load(state.api().clone(), product_id)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, %product_id, "Failed to load photos");
            Notice::error(format!("Could not load photos: {}", e.user_message()))
        })
}

/// Pull the uploaded file out of the multipart body.
async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<PhotoUpload, Notice> {
    let too_large = || {
        Notice::error(format!(
            "Upload rejected: {}.",
            UploadError::TooLarge {
                size: max_bytes.saturating_add(1),
                limit: max_bytes,
            }
        ))
    };
    let unreadable = |e: &axum::extract::multipart::MultipartError| {
        tracing::warn!(error = %e, "Unreadable upload");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large()
        } else {
            Notice::error("The upload could not be read.")
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| unreadable(&e))? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| unreadable(&e))?;

        return PhotoUpload::new(
            file_name.as_deref(),
            content_type.as_deref(),
            bytes.to_vec(),
            max_bytes,
        )
        .map_err(|e| Notice::error(format!("Upload rejected: {e}.")));
    }

    Err(Notice::error(format!("Upload rejected: {}.", UploadError::Empty)))
}

/// Photo gallery page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<PhotosIndexTemplate, AppError> {
    let gallery = PhotoGallery::load(state.api().clone(), product_id).await?;
    let notices = take_notices(&session).await?;

    Ok(PhotosIndexTemplate::new(
        &gallery,
        notices,
        state.config().photos.max_upload_bytes,
    ))
}

/// Upload a photo (multipart field `photo`).
#[instrument(skip(state, session, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let max_bytes = state.config().photos.max_upload_bytes;
    let notice = match read_upload(&mut multipart, max_bytes).await {
        Ok(upload) => {
            PhotoGallery::new(state.api().clone(), product_id)
                .upload(upload)
                .await
        }
        Err(notice) => notice,
    };
    flash(&session, [notice]).await?;
    Ok(back(product_id))
}

/// Delete a photo.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path((product_id, photo_id)): Path<(ProductId, PhotoId)>,
) -> Result<Redirect, AppError> {
    let notice = PhotoGallery::new(state.api().clone(), product_id)
        .delete(photo_id)
        .await;
    flash(&session, [notice]).await?;
    Ok(back(product_id))
}

/// Make a photo the product's primary image.
#[instrument(skip(state, session))]
pub async fn set_primary(
    State(state): State<AppState>,
    session: Session,
    Path((product_id, photo_id)): Path<(ProductId, PhotoId)>,
) -> Result<Redirect, AppError> {
    let notice = PhotoGallery::new(state.api().clone(), product_id)
        .set_primary(photo_id)
        .await;
    flash(&session, [notice]).await?;
    Ok(back(product_id))
}

/// Reorder form data.
#[derive(Debug, Deserialize)]
pub struct ReorderForm {
    pub order: String,
}

/// Persist a full photo order.
#[instrument(skip(state, session))]
pub async fn reorder(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Form(form): Form<ReorderForm>,
) -> Result<Redirect, AppError> {
    let notice = match parse_order(&form.order) {
        None => Notice::error("The photo order could not be read."),
        Some(order) => match load_gallery(&state, product_id).await {
            Ok(mut gallery) => gallery.reorder(&order).await,
            Err(notice) => notice,
        },
    };
    flash(&session, [notice]).await?;
    Ok(back(product_id))
}

/// Move form data.
#[derive(Debug, Deserialize)]
pub struct MoveForm {
    pub direction: Direction,
}

/// Move a photo one step up or down.
#[instrument(skip(state, session))]
pub async fn move_photo(
    State(state): State<AppState>,
    session: Session,
    Path((product_id, photo_id)): Path<(ProductId, PhotoId)>,
    Form(form): Form<MoveForm>,
) -> Result<Redirect, AppError> {
    let notice = match load_gallery(&state, product_id).await {
        Ok(mut gallery) => gallery.move_photo(photo_id, form.direction).await,
        Err(notice) => notice,
    };
    flash(&session, [notice]).await?;
    Ok(back(product_id))
}

/// Push temporary photos to the commerce platform.
#[instrument(skip(state, session))]
pub async fn sync(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    let notice = match load_gallery(&state, product_id).await {
        Ok(mut gallery) => gallery.sync().await,
        Err(notice) => notice,
    };
    flash(&session, [notice]).await?;
    Ok(back(product_id))
}
