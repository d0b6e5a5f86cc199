//! Australia Post adapter
//!
//! Primary domestic carrier. Speaks the Australia Post shipping API
//! (`/prices/items`, `/shipments`, `/labels`, `/track`) through a pluggable
//! transport so the adapter is testable without a network.

use crate::adapter::{BookingConfirmation, CarrierAdapter};
use crate::error::{CarrierError, CarrierErrorKind, CarrierResult};
use async_trait::async_trait;
use freight_types::{
    CarrierId, PackageSpec, Quote, Route, ShipmentStatus, TrackingEvent, TrackingNumber,
    TrackingSnapshot,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const CARRIER_ID: &str = "auspost";
pub const DEFAULT_BASE_URL: &str = "https://digitalapi.auspost.com.au/shipping/v1";

/// Wire request for a domestic price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRequest {
    pub from_postcode: String,
    pub to_postcode: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
}

/// Wire response for a price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    /// Total cost in dollars as the API reports it
    pub total_cost: f64,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub delivery_time_days: Option<u32>,
}

/// Wire request for shipment creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub sender_details: freight_types::Address,
    pub recipient_details: freight_types::Address,
    pub items: Vec<PackageSpec>,
}

/// Wire response for shipment creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentResponse {
    pub shipment_id: String,
    pub tracking_number: String,

    #[serde(default)]
    pub label_url: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// One tracking event as the API reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEvent {
    pub date: chrono::DateTime<chrono::Utc>,
    pub status: String,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Wire response for a tracking lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackResponse {
    pub status: String,

    #[serde(default)]
    pub events: Vec<TrackEvent>,
}

/// Transport abstraction over the Australia Post API
#[async_trait]
pub trait AusPostTransport: Send + Sync {
    async fn get_price(&self, request: &PriceRequest) -> CarrierResult<PriceResponse>;

    async fn create_shipment(&self, request: &ShipmentRequest) -> CarrierResult<ShipmentResponse>;

    async fn track(&self, tracking_number: &str) -> CarrierResult<TrackResponse>;
}

/// Credentials and endpoint for the HTTP transport
#[derive(Debug, Clone)]
pub struct AusPostCredentials {
    pub api_key: String,
    pub account_number: String,
    pub base_url: String,
}

/// reqwest-backed transport speaking the real API
pub struct HttpAusPostTransport {
    client: reqwest::Client,
    credentials: AusPostCredentials,
}

impl HttpAusPostTransport {
    pub fn new(credentials: AusPostCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn carrier() -> CarrierId {
        CarrierId::new(CARRIER_ID)
    }

    fn classify(err: reqwest::Error) -> CarrierError {
        let kind = if err.is_timeout() {
            CarrierErrorKind::Timeout
        } else if let Some(status) = err.status() {
            if status.is_server_error() || status.as_u16() == 429 {
                CarrierErrorKind::Transport
            } else if status == reqwest::StatusCode::NOT_FOUND {
                CarrierErrorKind::NotFound
            } else if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                CarrierErrorKind::InvalidConfig
            } else {
                CarrierErrorKind::Rejected
            }
        } else {
            CarrierErrorKind::Transport
        };
        CarrierError::new(Self::carrier(), kind, err.to_string())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(
                method,
                format!("{}{}", self.credentials.base_url, path),
            )
            .header("Auth-Key", &self.credentials.api_key)
            .header("Account-Number", &self.credentials.account_number)
    }
}

#[async_trait]
impl AusPostTransport for HttpAusPostTransport {
    async fn get_price(&self, request: &PriceRequest) -> CarrierResult<PriceResponse> {
        let response = self
            .request(reqwest::Method::POST, "/prices/items")
            .json(request)
            .send()
            .await
            .map_err(Self::classify)?
            .error_for_status()
            .map_err(Self::classify)?;

        response.json().await.map_err(Self::classify)
    }

    async fn create_shipment(&self, request: &ShipmentRequest) -> CarrierResult<ShipmentResponse> {
        let response = self
            .request(reqwest::Method::POST, "/shipments")
            .json(request)
            .send()
            .await
            .map_err(Self::classify)?
            .error_for_status()
            .map_err(Self::classify)?;

        response.json().await.map_err(Self::classify)
    }

    async fn track(&self, tracking_number: &str) -> CarrierResult<TrackResponse> {
        let response = self
            .request(reqwest::Method::GET, "/track")
            .query(&[("tracking_numbers", tracking_number)])
            .send()
            .await
            .map_err(Self::classify)?
            .error_for_status()
            .map_err(Self::classify)?;

        response.json().await.map_err(Self::classify)
    }
}

/// Australia Post carrier adapter
pub struct AusPostAdapter {
    transport: Arc<dyn AusPostTransport>,
}

impl std::fmt::Debug for AusPostAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AusPostAdapter").finish()
    }
}

impl AusPostAdapter {
    pub fn new(credentials: AusPostCredentials) -> Self {
        Self::with_transport(Arc::new(HttpAusPostTransport::new(credentials)))
    }

    pub fn with_transport(transport: Arc<dyn AusPostTransport>) -> Self {
        Self { transport }
    }

    /// Map the carrier's native status vocabulary onto the canonical enum
    pub fn map_status(native: &str) -> ShipmentStatus {
        match native.to_ascii_lowercase().as_str() {
            "created" | "initiated" | "label printed" => ShipmentStatus::LabelCreated,
            "accepted" | "lodged" | "picked up" => ShipmentStatus::Shipped,
            "in transit" | "processing" | "awaiting collection" | "onboard for delivery" => {
                ShipmentStatus::InTransit
            }
            "delivered" => ShipmentStatus::Delivered,
            "cancelled" => ShipmentStatus::Cancelled,
            "returned to sender" | "unsuccessful delivery" => ShipmentStatus::Failed,
            // Unknown vocabulary must never advance the state machine.
            // Tracked shipments are at least LabelCreated, so reporting it
            // is a guaranteed no-op.
            _ => ShipmentStatus::LabelCreated,
        }
    }
}

#[async_trait]
impl CarrierAdapter for AusPostAdapter {
    fn id(&self) -> CarrierId {
        CarrierId::new(CARRIER_ID)
    }

    async fn quote(&self, spec: &PackageSpec, route: &Route) -> CarrierResult<Quote> {
        let request = PriceRequest {
            from_postcode: route.sender.postcode.clone(),
            to_postcode: route.recipient.postcode.clone(),
            length: spec.length_cm,
            width: spec.width_cm,
            height: spec.height_cm,
            weight: spec.weight_kg,
        };

        let response = self.transport.get_price(&request).await?;
        tracing::debug!(
            carrier = CARRIER_ID,
            total_cost = response.total_cost,
            "Received price"
        );

        // API reports dollars; store minor units
        let price_minor = (response.total_cost * 100.0).round() as i64;
        let currency = response.currency.unwrap_or_else(|| "AUD".to_string());
        let mut quote = Quote::priced(self.id(), price_minor, currency);
        if let freight_types::QuoteOutcome::Priced { transit_days, .. } = &mut quote.outcome {
            *transit_days = response.delivery_time_days;
        }
        Ok(quote)
    }

    async fn create_shipment(
        &self,
        spec: &PackageSpec,
        route: &Route,
    ) -> CarrierResult<BookingConfirmation> {
        let request = ShipmentRequest {
            sender_details: route.sender.clone(),
            recipient_details: route.recipient.clone(),
            items: vec![spec.clone()],
        };

        let response = self.transport.create_shipment(&request).await?;
        tracing::info!(
            carrier = CARRIER_ID,
            shipment_id = %response.shipment_id,
            tracking_number = %response.tracking_number,
            "Shipment created"
        );

        Ok(BookingConfirmation {
            tracking_number: TrackingNumber::new(response.tracking_number),
            label_ref: response.label_url,
            raw: Some(serde_json::json!({
                "shipment_id": response.shipment_id,
                "extra": response.extra,
            })),
        })
    }

    async fn track(&self, tracking_number: &TrackingNumber) -> CarrierResult<TrackingSnapshot> {
        let response = self.transport.track(tracking_number.as_str()).await?;

        let events = response
            .events
            .iter()
            .map(|e| TrackingEvent {
                timestamp: e.date,
                status: Self::map_status(&e.status),
                location: e.location.clone(),
                description: e.description.clone().unwrap_or_else(|| e.status.clone()),
            })
            .collect();

        Ok(TrackingSnapshot {
            status: Self::map_status(&response.status),
            events,
            raw: serde_json::to_value(&response).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freight_types::Address;

    struct FixedTransport {
        price: f64,
    }

    #[async_trait]
    impl AusPostTransport for FixedTransport {
        async fn get_price(&self, _request: &PriceRequest) -> CarrierResult<PriceResponse> {
            Ok(PriceResponse {
                total_cost: self.price,
                currency: None,
                delivery_time_days: Some(3),
            })
        }

        async fn create_shipment(
            &self,
            _request: &ShipmentRequest,
        ) -> CarrierResult<ShipmentResponse> {
            Ok(ShipmentResponse {
                shipment_id: "S-1".to_string(),
                tracking_number: "AP123".to_string(),
                label_url: Some("https://example.com/label.pdf".to_string()),
                extra: serde_json::json!({}),
            })
        }

        async fn track(&self, _tracking_number: &str) -> CarrierResult<TrackResponse> {
            Ok(TrackResponse {
                status: "In transit".to_string(),
                events: vec![TrackEvent {
                    date: chrono::Utc::now(),
                    status: "Accepted".to_string(),
                    location: Some("Sydney".to_string()),
                    description: None,
                }],
            })
        }
    }

    fn address(postcode: &str) -> Address {
        Address {
            name: "Test".to_string(),
            lines: vec!["1 Test St".to_string()],
            suburb: "Sydney".to_string(),
            state: "NSW".to_string(),
            postcode: postcode.to_string(),
            country: "AU".to_string(),
            phone: None,
            email: None,
        }
    }

    fn spec() -> PackageSpec {
        PackageSpec {
            weight_kg: 2.0,
            length_cm: 30.0,
            width_cm: 20.0,
            height_cm: 10.0,
            declared_value_minor: None,
            description: None,
        }
    }

    fn route() -> Route {
        Route {
            sender: address("2000"),
            recipient: address("3000"),
        }
    }

    #[tokio::test]
    async fn quote_converts_dollars_to_minor_units() {
        let adapter = AusPostAdapter::with_transport(Arc::new(FixedTransport { price: 12.45 }));
        let quote = adapter.quote(&spec(), &route()).await.unwrap();
        assert_eq!(quote.price_minor(), Some(1245));
    }

    #[tokio::test]
    async fn booking_returns_tracking_and_label() {
        let adapter = AusPostAdapter::with_transport(Arc::new(FixedTransport { price: 10.0 }));
        let confirmation = adapter.create_shipment(&spec(), &route()).await.unwrap();
        assert_eq!(confirmation.tracking_number.as_str(), "AP123");
        assert!(confirmation.label_ref.is_some());
    }

    #[tokio::test]
    async fn tracking_maps_native_vocabulary() {
        let adapter = AusPostAdapter::with_transport(Arc::new(FixedTransport { price: 10.0 }));
        let snapshot = adapter.track(&TrackingNumber::new("AP123")).await.unwrap();
        assert_eq!(snapshot.status, ShipmentStatus::InTransit);
        assert_eq!(snapshot.events[0].status, ShipmentStatus::Shipped);
    }

    #[test]
    fn status_mapping_covers_terminals() {
        assert_eq!(AusPostAdapter::map_status("Delivered"), ShipmentStatus::Delivered);
        assert_eq!(AusPostAdapter::map_status("Cancelled"), ShipmentStatus::Cancelled);
        assert_eq!(
            AusPostAdapter::map_status("Returned to sender"),
            ShipmentStatus::Failed
        );
    }

    #[test]
    fn unknown_vocabulary_never_advances_a_shipment() {
        assert_eq!(
            AusPostAdapter::map_status("Awaiting lodgement"),
            ShipmentStatus::LabelCreated
        );
        assert_eq!(AusPostAdapter::map_status(""), ShipmentStatus::LabelCreated);
    }
}
