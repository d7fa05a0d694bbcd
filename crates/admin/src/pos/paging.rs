//! Accumulating paginated results with stale-response protection.
//!
//! A screen asks for a [`FetchTicket`] before each request and hands it back
//! with the response. Any reset (new filter, new search) bumps the
//! generation, so responses to superseded queries are dropped instead of
//! being appended to the new result list.

use serde::{Deserialize, Serialize};

use crate::api::Page;

/// Identifies one in-flight page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
}

/// Items accumulated across pages of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedList<T> {
    items: Vec<T>,
    next_page: u32,
    has_more: bool,
    generation: u64,
    in_flight: Option<FetchTicket>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page: 1,
            has_more: true,
            generation: 0,
            in_flight: None,
        }
    }
}

impl<T> PagedList<T> {
    /// Create an empty list that will start at page 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items loaded so far, in page order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whether another page can be requested.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a request for the current query is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Page number the next request will ask for.
    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.next_page
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Forget all results and start over at page 1.
    ///
    /// Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.items.clear();
        self.next_page = 1;
        self.has_more = true;
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = None;
    }

    /// Reserve the next page request.
    ///
    /// Returns `None` when every page has been loaded or a request for the
    /// current query is already in flight.
    pub fn begin(&mut self) -> Option<FetchTicket> {
        if !self.has_more || self.in_flight.is_some() {
            return None;
        }
        let ticket = FetchTicket {
            generation: self.generation,
            page: self.next_page,
        };
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Apply a fetched page. Returns `false` if the ticket is stale and the
    /// page was discarded.
    pub fn apply(&mut self, ticket: FetchTicket, page: Page<T>) -> bool {
        if ticket.generation != self.generation || self.in_flight != Some(ticket) {
            tracing::debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                "Discarding stale page"
            );
            return false;
        }

        self.has_more = page.has_more();
        self.next_page = page.page.saturating_add(1).max(ticket.page.saturating_add(1));
        self.items.extend(page.items);
        self.in_flight = None;
        true
    }

    /// Release a ticket whose request failed so the page can be retried.
    pub fn fail(&mut self, ticket: FetchTicket) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
    }

    /// Forget any outstanding ticket, e.g. one left behind by a request that
    /// never completed. A late response for it will be discarded.
    pub fn abandon_in_flight(&mut self) {
        self.in_flight = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page(items: Vec<u32>, page: u32, last_page: u32) -> Page<u32> {
        Page {
            items,
            page,
            last_page,
            total: None,
        }
    }

    #[test]
    fn test_pages_accumulate_in_order() {
        let mut list = PagedList::new();

        let first = list.begin().unwrap();
        assert_eq!(first.page, 1);
        assert!(list.apply(first, page(vec![1, 2], 1, 2)));

        let second = list.begin().unwrap();
        assert_eq!(second.page, 2);
        assert!(list.apply(second, page(vec![3], 2, 2)));

        assert_eq!(list.items(), &[1, 2, 3]);
        assert!(!list.has_more());
        assert!(list.begin().is_none());
    }

    #[test]
    fn test_only_one_request_in_flight() {
        let mut list: PagedList<u32> = PagedList::new();
        let ticket = list.begin().unwrap();

        assert!(list.is_loading());
        assert!(list.begin().is_none());

        list.fail(ticket);
        assert!(!list.is_loading());
        assert_eq!(list.begin().unwrap().page, 1);
    }

    #[test]
    fn test_reset_discards_stale_response() {
        let mut list = PagedList::new();
        let old = list.begin().unwrap();

        list.reset();
        let fresh = list.begin().unwrap();

        // The superseded query's response arrives late
        assert!(!list.apply(old, page(vec![9, 9], 1, 5)));
        assert!(list.items().is_empty());

        assert!(list.apply(fresh, page(vec![1], 1, 1)));
        assert_eq!(list.items(), &[1]);
    }

    #[test]
    fn test_reset_clears_results_and_pagination() {
        let mut list = PagedList::new();
        let ticket = list.begin().unwrap();
        list.apply(ticket, page(vec![1, 2, 3], 1, 4));
        assert_eq!(list.next_page(), 2);

        list.reset();

        assert!(list.items().is_empty());
        assert_eq!(list.next_page(), 1);
        assert!(list.has_more());
    }

    #[test]
    fn test_abandoned_ticket_response_is_discarded() {
        let mut list = PagedList::new();
        let ticket = list.begin().unwrap();

        list.abandon_in_flight();
        assert!(!list.apply(ticket, page(vec![1], 1, 1)));

        let retry = list.begin().unwrap();
        assert_eq!(retry.page, 1);
        assert!(list.apply(retry, page(vec![1], 1, 1)));
        assert_eq!(list.items(), &[1]);
    }

    #[test]
    fn test_failed_stale_ticket_does_not_release_current() {
        let mut list: PagedList<u32> = PagedList::new();
        let old = list.begin().unwrap();
        list.reset();
        let _current = list.begin().unwrap();

        list.fail(old);
        assert!(list.is_loading());
    }
}
