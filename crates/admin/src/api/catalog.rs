//! Catalog operations: products and categories.

use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;

use super::{
    ApiClient, ApiError, CacheKey, CacheValue,
    types::{Category, DataEnvelope, Page, PagedEnvelope, Product, ProductQuery},
};

impl ApiClient {
    /// List one page of products matching the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let mut url = self.endpoint("products")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("per_page", &query.per_page.to_string());
            if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("search", search);
            }
            if let Some(category) = query.category {
                pairs.append_pair("category_id", &category.to_string());
            }
        }

        let envelope: PagedEnvelope<Product> =
            Self::send_json(self.request(Method::GET, url)).await?;
        let page = Page::from(envelope);

        tracing::debug!(
            count = page.items.len(),
            page = page.page,
            last_page = page.last_page,
            "Fetched products"
        );
        Ok(page)
    }

    /// List all categories.
    ///
    /// Served from an in-memory cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            tracing::debug!("Category cache hit");
            return Ok(categories);
        }

        let url = self.endpoint("categories")?;
        let envelope: DataEnvelope<Vec<Category>> =
            Self::send_json(self.request(Method::GET, url)).await?;
        let categories = Arc::new(envelope.data);

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    /// Drop the cached category list so the next call refetches it.
    pub async fn invalidate_categories(&self) {
        self.inner.cache.invalidate(&CacheKey::Categories).await;
    }
}
