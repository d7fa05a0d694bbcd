//! Client (customer) search.

use reqwest::Method;
use tracing::instrument;

use super::{
    ApiClient, ApiError,
    types::{Client, ClientQuery, Page, PagedEnvelope},
};

impl ApiClient {
    /// Search clients by name, tax id, phone or email.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_clients(&self, query: &ClientQuery) -> Result<Page<Client>, ApiError> {
        let mut url = self.endpoint("clients")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("per_page", &query.per_page.to_string());
            if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("search", search);
            }
        }

        let envelope: PagedEnvelope<Client> =
            Self::send_json(self.request(Method::GET, url)).await?;
        Ok(Page::from(envelope))
    }
}
