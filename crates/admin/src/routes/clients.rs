//! Client picker route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfloor_core::ClientId;

use super::pos::POS_PATH;
use super::{flash, is_htmx_fragment, workspace};
use crate::api::Client;
use crate::error::AppError;
use crate::models::Notice;
use crate::pos::{ClientPicker, Workspace};
use crate::state::AppState;

/// Client row for templates.
#[derive(Debug, Clone)]
pub struct ClientView {
    pub id: ClientId,
    pub name: String,
    pub detail: String,
}

impl From<&Client> for ClientView {
    fn from(client: &Client) -> Self {
        let detail = [&client.tax_id, &client.phone, &client.email]
            .into_iter()
            .filter_map(|field| field.as_deref().filter(|s| !s.is_empty()))
            .collect::<Vec<_>>()
            .join(" · ");
        Self {
            id: client.id,
            name: client.name.clone(),
            detail,
        }
    }
}

/// Client picker display data.
#[derive(Debug, Clone)]
pub struct ClientPickerView {
    pub search: String,
    pub results: Vec<ClientView>,
    pub has_more: bool,
    pub selected: Option<ClientView>,
    /// Errors shown inside the picker when it is rendered on its own.
    pub errors: Vec<Notice>,
}

impl ClientPickerView {
    #[must_use]
    pub fn new(picker: &ClientPicker, errors: Vec<Notice>) -> Self {
        Self {
            search: picker.search_text().to_string(),
            results: picker.results().iter().map(ClientView::from).collect(),
            has_more: picker.has_more(),
            selected: picker.selected().map(ClientView::from),
            errors,
        }
    }
}

/// Client picker fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/client_picker.html")]
pub struct ClientPickerTemplate {
    pub clients: ClientPickerView,
}

/// Fetch the next client page and apply it unless the search changed.
pub(super) async fn fetch_clients(state: &AppState, ws: &Workspace) -> Vec<Notice> {
    let Some((ticket, query)) = ws.lock().await.clients.load_more() else {
        return Vec::new();
    };

    let result = state.api().list_clients(&query).await;

    let mut pos = ws.lock().await;
    match result {
        Ok(page) => {
            pos.clients.apply_page(ticket, page);
            Vec::new()
        }
        Err(e) => {
            pos.clients.fail(ticket);
            tracing::warn!(error = %e, page = ticket.page, "Failed to load clients");
            vec![Notice::error(format!(
                "Could not load clients: {}",
                e.user_message()
            ))]
        }
    }
}

/// Client search query parameters.
#[derive(Debug, Deserialize)]
pub struct ClientSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search clients.
///
/// HTMX requests get the picker fragment; plain requests are redirected to
/// the POS screen.
#[instrument(skip(state, session, headers))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<ClientSearchQuery>,
) -> Result<Response, AppError> {
    let ws = workspace(&state, &session).await?;
    ws.lock().await.clients.search(&query.q);
    let notices = fetch_clients(&state, &ws).await;

    if is_htmx_fragment(&headers) {
        let clients = ClientPickerView::new(&ws.lock().await.clients, notices);
        return Ok(ClientPickerTemplate { clients }.into_response());
    }

    flash(&session, notices).await?;
    Ok(Redirect::to(POS_PATH).into_response())
}

/// Load the next page of the current client search.
#[instrument(skip(state, session))]
pub async fn more(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    flash(&session, fetch_clients(&state, &ws).await).await?;
    Ok(Redirect::to(POS_PATH))
}

/// Client selection form data.
#[derive(Debug, Deserialize)]
pub struct SelectClientForm {
    pub client_id: ClientId,
}

/// Select the client the sale is for.
#[instrument(skip(state, session))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SelectClientForm>,
) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    let notice = match ws.lock().await.clients.select(form.client_id) {
        Ok(client) => Notice::success(format!("Selling to {}.", client.name)),
        Err(e) => {
            tracing::debug!(error = %e, "Client selection rejected");
            Notice::error("That client is not in the current results.")
        }
    };
    flash(&session, [notice]).await?;
    Ok(Redirect::to(POS_PATH))
}

/// Clear the selected client (walk-in sale).
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let ws = workspace(&state, &session).await?;
    ws.lock().await.clients.clear_selection();
    Ok(Redirect::to(POS_PATH))
}
