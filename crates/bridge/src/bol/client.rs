//! Retailer API client.
//!
//! Walks the paginated v9 listings and posts shipment confirmations. Every
//! call takes the bearer token explicitly; obtaining one is the job of
//! [`TokenCache`](super::TokenCache).

use std::sync::Arc;

use bol_bridge_core::{OrderId, OrderStatus};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use super::auth::BearerToken;
use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use super::{RETAILER_MEDIA_TYPE, UpstreamError};

/// Default upper bound on pages fetched by one walk.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Predicate applied to each raw item before it is transformed.
pub type ItemFilter<'a> = &'a (dyn Fn(&Value) -> bool + Sync);

/// A paginated listing endpoint.
#[derive(Debug, Clone)]
pub struct Listing {
    segments: &'static [&'static str],
    items_key: &'static str,
    query: Vec<(&'static str, String)>,
}

impl Listing {
    /// `GET /retailer/orders?status=...`, items under `orders`.
    #[must_use]
    pub fn orders(status: OrderStatus) -> Self {
        Self {
            segments: &["retailer", "orders"],
            items_key: "orders",
            query: vec![("status", status.as_str().to_string())],
        }
    }

    /// `GET /retailer/shipments`, items under `shipments`.
    #[must_use]
    pub const fn shipments() -> Self {
        Self {
            segments: &["retailer", "shipments"],
            items_key: "shipments",
            query: Vec::new(),
        }
    }

    /// Key of the item array in each page.
    #[must_use]
    pub const fn items_key(&self) -> &'static str {
        self.items_key
    }
}

/// Result of walking a listing.
#[derive(Debug)]
pub struct Aggregated<T> {
    /// Transformed items, in upstream order.
    pub items: Vec<T>,
    /// Number of pages that answered successfully.
    pub pages_fetched: u32,
    /// The failure that cut the walk short after page 1, if any.
    pub interrupted: Option<UpstreamError>,
}

impl<T> Aggregated<T> {
    /// Whether the walk stopped on a failed page.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.interrupted.is_some()
    }
}

/// Body of a shipment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentConfirmation {
    pub shipment_reference: String,
    pub transporter_code: String,
    pub track_and_trace: String,
}

impl ShipmentConfirmation {
    /// Confirmation for a delivered order, referenced as `DELIVERY-{order_id}`.
    #[must_use]
    pub fn delivery(
        order_id: &OrderId,
        transporter_code: impl Into<String>,
        track_and_trace: impl Into<String>,
    ) -> Self {
        Self {
            shipment_reference: format!("DELIVERY-{order_id}"),
            transporter_code: transporter_code.into(),
            track_and_trace: track_and_trace.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShipmentRequest<'a> {
    shipment_reference: &'a str,
    transport: TransportDetails<'a>,
    shipping_label_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransportDetails<'a> {
    transporter_code: &'a str,
    track_and_trace: &'a str,
}

impl<'a> From<&'a ShipmentConfirmation> for ShipmentRequest<'a> {
    fn from(confirmation: &'a ShipmentConfirmation) -> Self {
        Self {
            shipment_reference: &confirmation.shipment_reference,
            transport: TransportDetails {
                transporter_code: &confirmation.transporter_code,
                track_and_trace: &confirmation.track_and_trace,
            },
            shipping_label_id: None,
        }
    }
}

/// bol.com Retailer API client.
#[derive(Clone)]
pub struct BolClient {
    inner: Arc<BolClientInner>,
}

struct BolClientInner {
    transport: Arc<dyn HttpTransport>,
    api_base: Url,
    max_pages: u32,
}

impl BolClient {
    /// Create a client for the API rooted at `api_base`.
    ///
    /// `max_pages` is clamped to at least 1.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, api_base: Url, max_pages: u32) -> Self {
        Self {
            inner: Arc::new(BolClientInner {
                transport,
                api_base,
                max_pages: max_pages.max(1),
            }),
        }
    }

    /// Fetch every page of `listing`, keeping items accepted by `filter` and
    /// mapping them through `transform`.
    ///
    /// The walk ends when page 1's pagination block says so, when a page has
    /// no (or an empty) item array, or when a page repeats the previous one.
    /// The page ceiling only applies to listings without a pagination block.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError` if page 1 fails. Later failures end the walk
    /// and are reported in [`Aggregated::interrupted`].
    #[instrument(skip(self, token, transform, filter), fields(listing = listing.items_key))]
    pub async fn fetch_all<T, F>(
        &self,
        listing: &Listing,
        token: &BearerToken,
        transform: F,
        filter: Option<ItemFilter<'_>>,
    ) -> Result<Aggregated<T>, UpstreamError>
    where
        F: Fn(Value) -> T + Send,
        T: Send,
    {
        let mut items = Vec::new();
        let mut total_pages: Option<u32> = None;
        let mut previous: Option<Vec<Value>> = None;
        let mut pages_fetched = 0;
        let mut interrupted = None;
        let mut page = 1;

        loop {
            let body = match self.fetch_page(listing, token, page).await {
                Ok(body) => body,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "Page fetch failed, returning partial listing");
                    interrupted = Some(e);
                    break;
                }
            };
            pages_fetched = page;

            if page == 1 {
                total_pages = total_pages_of(&body);
            }

            let Some(page_items) = take_items(body, listing.items_key) else {
                debug!(page, "No item array, end of listing");
                break;
            };
            if page_items.is_empty() {
                debug!(page, "Empty page, end of listing");
                break;
            }
            if previous.as_ref() == Some(&page_items) {
                warn!(page, "Page repeats the previous one, stopping");
                break;
            }

            debug!(page, count = page_items.len(), "Fetched page");
            items.extend(
                page_items
                    .iter()
                    .filter(|item| filter.is_none_or(|keep| keep(*item)))
                    .cloned()
                    .map(&transform),
            );
            previous = Some(page_items);

            match total_pages {
                Some(total) if page >= total => break,
                None if page >= self.inner.max_pages => {
                    warn!(max_pages = self.inner.max_pages, "Reached page ceiling, stopping");
                    break;
                }
                _ => {}
            }
            page += 1;
        }

        Ok(Aggregated {
            items,
            pages_fetched,
            interrupted,
        })
    }

    /// Confirm shipment of an order.
    ///
    /// Returns the upstream payload; an empty body becomes `null` and a
    /// non-JSON body is returned as a string.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Status` with the upstream body if bol.com
    /// rejects the confirmation.
    #[instrument(skip(self, token, confirmation), fields(order_id = %order_id))]
    pub async fn confirm_shipment(
        &self,
        token: &BearerToken,
        order_id: &OrderId,
        confirmation: &ShipmentConfirmation,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["retailer", "orders", order_id.as_str(), "shipment"])?;
        let body = serde_json::to_string(&ShipmentRequest::from(confirmation))?;

        let request = authorized(HttpRequest::post(url), token)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body);

        let response = check_status(self.inner.transport.send(request).await?)?;

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)))
    }

    async fn fetch_page(
        &self,
        listing: &Listing,
        token: &BearerToken,
        page: u32,
    ) -> Result<Value, UpstreamError> {
        let mut url = self.endpoint(listing.segments)?;
        url.query_pairs_mut()
            .extend_pairs(listing.query.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("page", &page.to_string());

        let response =
            check_status(self.inner.transport.send(authorized(HttpRequest::get(url), token)).await?)?;

        if response.body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.inner.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidEndpoint(self.inner.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn authorized(request: HttpRequest, token: &BearerToken) -> HttpRequest {
    request
        .header(AUTHORIZATION, token.authorization())
        .header(ACCEPT, HeaderValue::from_static(RETAILER_MEDIA_TYPE))
}

fn check_status(response: HttpResponse) -> Result<HttpResponse, UpstreamError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(UpstreamError::Status {
            status: response.status.as_u16(),
            body: response.body,
        })
    }
}

/// `ceil(total / itemsPerPage)` from a page's `pagination` block.
fn total_pages_of(body: &Value) -> Option<u32> {
    let pagination = body.get("pagination")?;
    let total = pagination.get("total")?.as_u64()?;
    let per_page = pagination
        .get("itemsPerPage")?
        .as_u64()
        .filter(|n| *n > 0)?;
    u32::try_from(total.div_ceil(per_page)).ok()
}

fn take_items(body: Value, key: &str) -> Option<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}
