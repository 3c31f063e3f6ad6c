//! Retailer operations exposed by the bridge.
//!
//! Each operation obtains a token from the shared [`TokenCache`], walks or
//! calls the Retailer API through [`BolClient`] and flattens the result.

use std::sync::Arc;

use bol_bridge_core::{OrderId, OrderItemId, OrderRecord, OrderStatus, ShipmentRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::bol::conversions::{
    is_shipped, lenient_text, order_to_record, shipment_reference, shipment_to_record,
};
use crate::bol::{
    Aggregated, AuthError, BearerToken, BolClient, HttpTransport, Listing, ReqwestTransport,
    ShipmentConfirmation, TokenCache, UpstreamError,
};
use crate::clock::SystemClock;
use crate::config::BolConfig;
use crate::error::AppError;

/// Carrier used when a delivery confirmation names none.
pub const DEFAULT_TRANSPORTER_CODE: &str = "TNT";

/// Track-and-trace code used when a delivery confirmation names none.
pub const DEFAULT_TRACK_AND_TRACE: &str = "1234567890";

/// Request body of a delivery confirmation. Numeric fields are taken as
/// their decimal text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDelivery {
    #[serde(default, deserialize_with = "lenient_text")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub transporter_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub track_and_trace: Option<String>,
}

/// Result of a delivery confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    /// Always `delivered`.
    pub status: &'static str,
    /// Payload returned by bol.com.
    pub bol: Value,
}

/// Result of an order-id lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemLookup {
    /// First item of the matching order; `null` if the order has no items.
    pub order_item_id: Option<OrderItemId>,
}

/// The five bridge operations over one token cache and client.
#[derive(Clone)]
pub struct RetailerService {
    tokens: TokenCache,
    client: BolClient,
}

impl RetailerService {
    /// Create a service from its parts.
    #[must_use]
    pub const fn new(tokens: TokenCache, client: BolClient) -> Self {
        Self { tokens, client }
    }

    /// Create a service that talks to bol.com over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the HTTP client cannot be built or the login
    /// URL cannot carry a path.
    pub fn from_config(config: &BolConfig) -> Result<Self, AuthError> {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(config.request_timeout)?);
        let tokens = TokenCache::new(
            Arc::clone(&transport),
            Arc::new(SystemClock),
            config.credentials(),
            &config.login_url,
        )?;
        let client = BolClient::new(transport, config.api_url.clone(), config.max_pages);

        Ok(Self::new(tokens, client))
    }

    /// List orders, one record per order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` or `AppError::Upstream` if the first page
    /// cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, status: OrderStatus) -> Result<Vec<OrderRecord>, AppError> {
        let token = self.tokens.valid_token().await?;
        let result = self
            .client
            .fetch_all(&Listing::orders(status), &token, order_to_record, None)
            .await;

        Ok(self.settle(&token, result).await?.items)
    }

    /// Find the first item id of the order whose shipment reference is
    /// `reference`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `reference` is missing or blank,
    /// `AppError::NotFound` if no order matches, and the interrupting
    /// `AppError::Upstream` if no order matched before the walk broke off.
    #[instrument(skip(self))]
    pub async fn resolve_order_item_id(
        &self,
        reference: Option<&str>,
    ) -> Result<OrderItemLookup, AppError> {
        let reference = reference
            .filter(|reference| !reference.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing ?reference=".to_string()))?;

        let token = self.tokens.valid_token().await?;
        let matches_reference =
            |order: &Value| shipment_reference(order).as_deref() == Some(reference);
        let result = self
            .client
            .fetch_all(
                &Listing::orders(OrderStatus::All),
                &token,
                |order| order_to_record(order).order_item_id,
                Some(&matches_reference),
            )
            .await;
        let Aggregated {
            items, interrupted, ..
        } = self.settle(&token, result).await?;

        match (items.into_iter().next(), interrupted) {
            (Some(order_item_id), _) => Ok(OrderItemLookup { order_item_id }),
            (None, Some(e)) => Err(e.into()),
            (None, None) => Err(AppError::NotFound(format!(
                "no order with reference {reference}"
            ))),
        }
    }

    /// Confirm delivery of an order by registering a shipment for it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `orderId` is missing and
    /// `AppError::Rejected` with bol.com's body if the shipment is refused.
    #[instrument(skip(self, request), fields(order_id = tracing::field::Empty))]
    pub async fn confirm_delivery(
        &self,
        request: ConfirmDelivery,
    ) -> Result<DeliveryReceipt, AppError> {
        let order_id = request
            .order_id
            .filter(|id| !id.trim().is_empty())
            .map(OrderId::new)
            .ok_or_else(|| AppError::BadRequest("Missing orderId".to_string()))?;
        tracing::Span::current().record("order_id", order_id.as_str());

        let confirmation = ShipmentConfirmation::delivery(
            &order_id,
            request
                .transporter_code
                .unwrap_or_else(|| DEFAULT_TRANSPORTER_CODE.to_string()),
            request
                .track_and_trace
                .unwrap_or_else(|| DEFAULT_TRACK_AND_TRACE.to_string()),
        );

        let token = self.tokens.valid_token().await?;
        match self
            .client
            .confirm_shipment(&token, &order_id, &confirmation)
            .await
        {
            Ok(bol) => {
                info!(
                    transporter_code = %confirmation.transporter_code,
                    "Delivery confirmed"
                );
                Ok(DeliveryReceipt {
                    status: "delivered",
                    bol,
                })
            }
            Err(e) => {
                self.note_failure(&token, &e).await;
                match e {
                    UpstreamError::Status { status, body } => {
                        warn!(status, "bol.com rejected delivery confirmation");
                        Err(AppError::Rejected { status, body })
                    }
                    other => Err(other.into()),
                }
            }
        }
    }

    /// List shipments, one record per shipment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` or `AppError::Upstream` if the first page
    /// cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list_shipments(&self) -> Result<Vec<ShipmentRecord>, AppError> {
        let token = self.tokens.valid_token().await?;
        let result = self
            .client
            .fetch_all(&Listing::shipments(), &token, shipment_to_record, None)
            .await;

        Ok(self.settle(&token, result).await?.items)
    }

    /// List orders whose fulfilment status is `SHIPPED`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` or `AppError::Upstream` if the first page
    /// cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list_delivered_orders(&self) -> Result<Vec<OrderRecord>, AppError> {
        let token = self.tokens.valid_token().await?;
        let result = self
            .client
            .fetch_all(
                &Listing::orders(OrderStatus::All),
                &token,
                order_to_record,
                Some(&is_shipped),
            )
            .await;

        Ok(self.settle(&token, result).await?.items)
    }

    /// Whether a valid token is cached or can be obtained now.
    pub async fn is_ready(&self) -> bool {
        match self.tokens.valid_token().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Readiness check could not obtain a token");
                false
            }
        }
    }

    /// Log partial walks and turn a failed first page into an `AppError`.
    async fn settle<T: Send>(
        &self,
        token: &BearerToken,
        result: Result<Aggregated<T>, UpstreamError>,
    ) -> Result<Aggregated<T>, AppError> {
        match result {
            Ok(aggregated) => {
                if let Some(e) = &aggregated.interrupted {
                    self.note_failure(token, e).await;
                    warn!(
                        pages = aggregated.pages_fetched,
                        items = aggregated.items.len(),
                        error = %e,
                        "Listing truncated by upstream failure"
                    );
                }
                Ok(aggregated)
            }
            Err(e) => {
                self.note_failure(token, &e).await;
                Err(e.into())
            }
        }
    }

    async fn note_failure(&self, token: &BearerToken, error: &UpstreamError) {
        if error.is_unauthorized() {
            self.tokens.invalidate(token).await;
        }
    }
}
