//! Catalog browsing state for the POS screen.

use serde::{Deserialize, Serialize};

use shopfloor_core::CategoryId;

use super::paging::{FetchTicket, PagedList};
use crate::api::{Category, Page, Product, ProductQuery};

/// Which categories the product grid shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    /// The synthetic "all" entry.
    #[default]
    All,
    Only(CategoryId),
}

impl CategoryFilter {
    /// Parse the form value used by the category strip (`"all"` or an id).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        value.parse::<CategoryId>().ok().map(Self::Only)
    }

    /// Category id to send to the API, if filtering.
    #[must_use]
    pub const fn category_id(&self) -> Option<CategoryId> {
        match self {
            Self::All => None,
            Self::Only(id) => Some(*id),
        }
    }

    /// Form value for this filter.
    #[must_use]
    pub fn form_value(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Only(id) => id.to_string(),
        }
    }
}

/// One entry of the category strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub filter: CategoryFilter,
    pub name: String,
}

/// Filter inputs plus the accumulated product grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBrowser {
    categories: Vec<Category>,
    filter: CategoryFilter,
    search: String,
    products: PagedList<Product>,
    page_size: u32,
}

impl CatalogBrowser {
    /// Label of the synthetic category that disables filtering.
    pub const ALL_LABEL: &'static str = "All";

    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            categories: Vec::new(),
            filter: CategoryFilter::All,
            search: String::new(),
            products: PagedList::new(),
            page_size: page_size.max(1),
        }
    }

    /// Replace the known categories.
    ///
    /// If the selected category disappeared the filter falls back to "all".
    /// Returns the first-page query when that fallback reset the grid.
    pub fn set_categories(&mut self, categories: Vec<Category>) -> Option<ProductQuery> {
        self.categories = categories;
        match self.filter {
            CategoryFilter::Only(id) if !self.categories.iter().any(|c| c.id == id) => {
                Some(self.select_category(CategoryFilter::All))
            }
            _ => None,
        }
    }

    /// Category strip entries, synthetic "all" first.
    #[must_use]
    pub fn category_options(&self) -> Vec<CategoryOption> {
        std::iter::once(CategoryOption {
            filter: CategoryFilter::All,
            name: Self::ALL_LABEL.to_string(),
        })
        .chain(self.categories.iter().map(|c| CategoryOption {
            filter: CategoryFilter::Only(c.id),
            name: c.name.clone(),
        }))
        .collect()
    }

    #[must_use]
    pub const fn filter(&self) -> CategoryFilter {
        self.filter
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        self.products.items()
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.products.has_more()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.products.is_loading()
    }

    /// Find a loaded product by id.
    #[must_use]
    pub fn product(&self, id: shopfloor_core::ProductId) -> Option<&Product> {
        self.products.items().iter().find(|p| p.id == id)
    }

    /// Switch category. Pagination and the result list start over.
    pub fn select_category(&mut self, filter: CategoryFilter) -> ProductQuery {
        self.filter = filter;
        self.products.reset();
        self.query_for(1)
    }

    /// Change the search text. Returns `None` when the trimmed text is
    /// unchanged; otherwise pagination and the result list start over.
    pub fn set_search(&mut self, text: &str) -> Option<ProductQuery> {
        let text = text.trim();
        if text == self.search {
            return None;
        }
        self.search = text.to_string();
        self.products.reset();
        Some(self.query_for(1))
    }

    /// Reserve the next page of the current query.
    pub fn load_more(&mut self) -> Option<(FetchTicket, ProductQuery)> {
        let ticket = self.products.begin()?;
        Some((ticket, self.query_for(ticket.page)))
    }

    /// Apply a fetched page; stale pages are discarded.
    pub fn apply_page(&mut self, ticket: FetchTicket, page: Page<Product>) -> bool {
        self.products.apply(ticket, page)
    }

    /// Release a ticket whose request failed.
    pub fn fail(&mut self, ticket: FetchTicket) {
        self.products.fail(ticket);
    }

    /// Forget an outstanding request that will never complete.
    pub fn abandon_in_flight(&mut self) {
        self.products.abandon_in_flight();
    }

    fn query_for(&self, page: u32) -> ProductQuery {
        ProductQuery {
            page,
            per_page: self.page_size,
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            category: self.filter.category_id(),
        }
    }
}
