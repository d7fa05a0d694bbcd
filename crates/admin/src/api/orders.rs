//! Order submission.

use reqwest::Method;
use tracing::instrument;

use super::{
    ApiClient, ApiError,
    types::{DataEnvelope, OrderDraft, OrderReceipt},
};

impl ApiClient {
    /// Submit an order built at the POS.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the remote service rejects the order
    /// (e.g., stock changed since the catalog was fetched), or another error
    /// if the request fails.
    #[instrument(skip(self, draft), fields(lines = draft.items.len(), client_id = ?draft.client_id))]
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<OrderReceipt, ApiError> {
        let url = self.endpoint("orders")?;
        let envelope: DataEnvelope<OrderReceipt> =
            Self::send_json(self.request(Method::POST, url).json(draft)).await?;

        tracing::info!(order_id = %envelope.data.id, "Order created");
        Ok(envelope.data)
    }
}
