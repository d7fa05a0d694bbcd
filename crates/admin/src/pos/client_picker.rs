//! Client picker: search, page through results, select.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfloor_core::ClientId;

use super::paging::{FetchTicket, PagedList};
use crate::api::{Client, ClientQuery, Page};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("client {0} is not in the current results")]
    ClientNotLoaded(ClientId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPicker {
    search: String,
    results: PagedList<Client>,
    selected: Option<Client>,
    page_size: u32,
}

impl ClientPicker {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            results: PagedList::new(),
            selected: None,
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn results(&self) -> &[Client] {
        self.results.items()
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.results.has_more()
    }

    #[must_use]
    pub const fn selected(&self) -> Option<&Client> {
        self.selected.as_ref()
    }

    /// Start a new search; previous results are dropped.
    pub fn search(&mut self, text: &str) -> ClientQuery {
        self.search = text.trim().to_string();
        self.results.reset();
        self.query_for(1)
    }

    /// Reserve the next page of the current search.
    pub fn load_more(&mut self) -> Option<(FetchTicket, ClientQuery)> {
        let ticket = self.results.begin()?;
        Some((ticket, self.query_for(ticket.page)))
    }

    pub fn apply_page(&mut self, ticket: FetchTicket, page: Page<Client>) -> bool {
        self.results.apply(ticket, page)
    }

    pub fn fail(&mut self, ticket: FetchTicket) {
        self.results.fail(ticket);
    }

    pub fn abandon_in_flight(&mut self) {
        self.results.abandon_in_flight();
    }

    /// Select a client from the loaded results.
    ///
    /// # Errors
    ///
    /// `ClientNotLoaded` if the id is not among the current results.
    pub fn select(&mut self, id: ClientId) -> Result<&Client, PickerError> {
        let client = self
            .results
            .items()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(PickerError::ClientNotLoaded(id))?;
        let selected: &Client = self.selected.insert(client);
        Ok(selected)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn query_for(&self, page: u32) -> ClientQuery {
        ClientQuery {
            page,
            per_page: self.page_size,
            search: (!self.search.is_empty()).then(|| self.search.clone()),
        }
    }
}
