//! Toll Priority adapter
//!
//! Second carrier, covering packages above Australia Post's limits. The wire
//! format differs from Australia Post (prices already in cents, different
//! status vocabulary) but the adapter shape is identical: a transport trait
//! plus a thin mapping layer.

use crate::adapter::{BookingConfirmation, CarrierAdapter};
use crate::error::{CarrierError, CarrierErrorKind, CarrierResult};
use async_trait::async_trait;
use freight_types::{
    CarrierId, PackageSpec, Quote, Route, ShipmentStatus, TrackingEvent, TrackingNumber,
    TrackingSnapshot,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const CARRIER_ID: &str = "toll";
pub const DEFAULT_BASE_URL: &str = "https://api.tollgroup.com/priority/v2";

/// Wire request for a rate lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRequest {
    pub origin_postcode: String,
    pub destination_postcode: String,
    pub weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

/// Wire response for a rate lookup; `net_price_cents` is already minor units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateResponse {
    pub net_price_cents: i64,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub service_days: Option<u32>,
}

/// Wire request for a consignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsignmentRequest {
    pub sender: freight_types::Address,
    pub receiver: freight_types::Address,
    pub items: Vec<PackageSpec>,
}

/// Wire response for a consignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsignmentResponse {
    pub consignment_id: String,
    pub connote: String,

    #[serde(default)]
    pub label_url: Option<String>,
}

/// Wire response for a tracking lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsignmentStatus {
    pub status_code: String,

    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub status_code: String,

    #[serde(default)]
    pub depot: Option<String>,

    #[serde(default)]
    pub remarks: Option<String>,
}

/// Transport abstraction over the Toll Priority API
#[async_trait]
pub trait TollTransport: Send + Sync {
    async fn rate(&self, request: &RateRequest) -> CarrierResult<RateResponse>;

    async fn create_consignment(
        &self,
        request: &ConsignmentRequest,
    ) -> CarrierResult<ConsignmentResponse>;

    async fn consignment_status(&self, connote: &str) -> CarrierResult<ConsignmentStatus>;
}

/// Credentials and endpoint for the HTTP transport
#[derive(Debug, Clone)]
pub struct TollCredentials {
    pub api_key: String,
    pub base_url: String,
}

/// reqwest-backed transport speaking the real API
pub struct HttpTollTransport {
    client: reqwest::Client,
    credentials: TollCredentials,
}

impl HttpTollTransport {
    pub fn new(credentials: TollCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
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
        CarrierError::new(CarrierId::new(CARRIER_ID), kind, err.to_string())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(
                method,
                format!("{}{}", self.credentials.base_url, path),
            )
            .bearer_auth(&self.credentials.api_key)
    }
}

#[async_trait]
impl TollTransport for HttpTollTransport {
    async fn rate(&self, request: &RateRequest) -> CarrierResult<RateResponse> {
        let response = self
            .request(reqwest::Method::POST, "/rates")
            .json(request)
            .send()
            .await
            .map_err(Self::classify)?
            .error_for_status()
            .map_err(Self::classify)?;

        response.json().await.map_err(Self::classify)
    }

    async fn create_consignment(
        &self,
        request: &ConsignmentRequest,
    ) -> CarrierResult<ConsignmentResponse> {
        let response = self
            .request(reqwest::Method::POST, "/consignments")
            .json(request)
            .send()
            .await
            .map_err(Self::classify)?
            .error_for_status()
            .map_err(Self::classify)?;

        response.json().await.map_err(Self::classify)
    }

    async fn consignment_status(&self, connote: &str) -> CarrierResult<ConsignmentStatus> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/consignments/{}/status", connote),
            )
            .send()
            .await
            .map_err(Self::classify)?
            .error_for_status()
            .map_err(Self::classify)?;

        response.json().await.map_err(Self::classify)
    }
}

/// Toll Priority carrier adapter
pub struct TollAdapter {
    transport: Arc<dyn TollTransport>,
}

impl std::fmt::Debug for TollAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TollAdapter").finish()
    }
}

impl TollAdapter {
    pub fn new(credentials: TollCredentials) -> Self {
        Self::with_transport(Arc::new(HttpTollTransport::new(credentials)))
    }

    pub fn with_transport(transport: Arc<dyn TollTransport>) -> Self {
        Self { transport }
    }

    /// Map Toll status codes onto the canonical enum
    pub fn map_status(code: &str) -> ShipmentStatus {
        match code.to_ascii_uppercase().as_str() {
            "BKD" | "CONF" => ShipmentStatus::LabelCreated,
            "PKP" => ShipmentStatus::Shipped,
            "TRN" | "DEP" | "OFD" => ShipmentStatus::InTransit,
            "DEL" | "POD" => ShipmentStatus::Delivered,
            "CAN" => ShipmentStatus::Cancelled,
            "RTS" => ShipmentStatus::Failed,
            // Unknown codes must never advance the state machine; tracked
            // shipments are at least LabelCreated, so this is a no-op.
            _ => ShipmentStatus::LabelCreated,
        }
    }
}

#[async_trait]
impl CarrierAdapter for TollAdapter {
    fn id(&self) -> CarrierId {
        CarrierId::new(CARRIER_ID)
    }

    async fn quote(&self, spec: &PackageSpec, route: &Route) -> CarrierResult<Quote> {
        let request = RateRequest {
            origin_postcode: route.sender.postcode.clone(),
            destination_postcode: route.recipient.postcode.clone(),
            weight_kg: spec.weight_kg,
            length_cm: spec.length_cm,
            width_cm: spec.width_cm,
            height_cm: spec.height_cm,
        };

        let response = self.transport.rate(&request).await?;
        tracing::debug!(
            carrier = CARRIER_ID,
            net_price_cents = response.net_price_cents,
            "Received rate"
        );

        let currency = response.currency.unwrap_or_else(|| "AUD".to_string());
        let mut quote = Quote::priced(self.id(), response.net_price_cents, currency);
        if let freight_types::QuoteOutcome::Priced { transit_days, .. } = &mut quote.outcome {
            *transit_days = response.service_days;
        }
        Ok(quote)
    }

    async fn create_shipment(
        &self,
        spec: &PackageSpec,
        route: &Route,
    ) -> CarrierResult<BookingConfirmation> {
        let request = ConsignmentRequest {
            sender: route.sender.clone(),
            receiver: route.recipient.clone(),
            items: vec![spec.clone()],
        };

        let response = self.transport.create_consignment(&request).await?;
        tracing::info!(
            carrier = CARRIER_ID,
            consignment_id = %response.consignment_id,
            connote = %response.connote,
            "Consignment created"
        );

        Ok(BookingConfirmation {
            tracking_number: TrackingNumber::new(response.connote),
            label_ref: response.label_url,
            raw: Some(serde_json::json!({ "consignment_id": response.consignment_id })),
        })
    }

    async fn track(&self, tracking_number: &TrackingNumber) -> CarrierResult<TrackingSnapshot> {
        let response = self
            .transport
            .consignment_status(tracking_number.as_str())
            .await?;

        let events = response
            .milestones
            .iter()
            .map(|m| TrackingEvent {
                timestamp: m.occurred_at,
                status: Self::map_status(&m.status_code),
                location: m.depot.clone(),
                description: m.remarks.clone().unwrap_or_else(|| m.status_code.clone()),
            })
            .collect();

        Ok(TrackingSnapshot {
            status: Self::map_status(&response.status_code),
            events,
            raw: serde_json::to_value(&response).ok(),
        })
    }
}
