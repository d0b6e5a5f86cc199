//! Shipping handlers
//!
//! Request and response shapes here are consumed by an existing frontend and
//! must not drift: camelCase field names, `value` in whole currency units,
//! non-2xx bodies carrying `{ "detail": ... }`.

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiJson, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use freight_types::{
    Address, OrderId, PackageSpec, Route, ShipmentStatus, TrackingEvent, TrackingNumber,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /shipping/create`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    /// Order this shipment fulfils; generated when the caller omits it
    #[serde(default)]
    pub order_id: Option<String>,

    pub sender_details: AddressPayload,
    pub recipient_details: AddressPayload,
    pub items: Vec<ItemPayload>,
}

/// Address as the frontend sends it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub name: String,

    #[serde(default)]
    pub lines: Vec<String>,

    #[serde(default)]
    pub suburb: String,

    #[serde(default)]
    pub state: String,

    pub postcode: String,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

impl From<AddressPayload> for Address {
    fn from(payload: AddressPayload) -> Self {
        Address {
            name: payload.name,
            lines: payload.lines,
            suburb: payload.suburb,
            state: payload.state,
            postcode: payload.postcode,
            country: payload.country.unwrap_or_else(|| "AU".to_string()),
            phone: payload.phone,
            email: payload.email,
        }
    }
}

/// One item: weight in kg, dimensions in cm, value in whole currency units
#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub value: Option<f64>,
}

impl From<ItemPayload> for PackageSpec {
    fn from(item: ItemPayload) -> Self {
        PackageSpec {
            weight_kg: item.weight,
            length_cm: item.length,
            width_cm: item.width,
            height_cm: item.height,
            declared_value_minor: item.value.map(|v| (v * 100.0).round() as i64),
            description: item.description,
        }
    }
}

/// Body of a successful `POST /shipping/create`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentResponse {
    pub id: String,
    pub carrier: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,

    pub status: ShipmentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<freight_types::Shipment> for CreateShipmentResponse {
    fn from(shipment: freight_types::Shipment) -> Self {
        CreateShipmentResponse {
            id: shipment.id.to_string(),
            carrier: shipment.carrier.0.clone(),
            tracking_number: shipment.tracking_number.map(|t| t.to_string()),
            status: shipment.status,
            label_url: shipment.label_ref,
            created_at: shipment.created_at,
        }
    }
}

/// Body of `GET /shipping/track/{trackingNumber}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackShipmentResponse {
    pub tracking_number: String,
    pub carrier: String,
    pub status: ShipmentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<chrono::DateTime<chrono::Utc>>,

    pub events: Vec<TrackingEventPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEventPayload {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub status: ShipmentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub description: String,
}

impl From<TrackingEvent> for TrackingEventPayload {
    fn from(event: TrackingEvent) -> Self {
        TrackingEventPayload {
            timestamp: event.timestamp,
            status: event.status,
            location: event.location,
            description: event.description,
        }
    }
}

/// Create a shipment: quote eligible carriers, pick one, book a label.
pub async fn create_shipment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateShipmentRequest>,
) -> ApiResult<(StatusCode, Json<CreateShipmentResponse>)> {
    if request.items.is_empty() {
        return Err(ApiError::BadRequest(
            "shipment request contains no items".to_string(),
        ));
    }

    let order_id = OrderId::new(
        request
            .order_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    );
    let items: Vec<PackageSpec> = request.items.into_iter().map(PackageSpec::from).collect();
    let spec = PackageSpec::bounding(&items).map_err(freight_engine::EngineError::from)?;
    let route = Route {
        sender: request.sender_details.into(),
        recipient: request.recipient_details.into(),
    };

    let shipment = state.labels.book(order_id, spec, route).await?;

    Ok((StatusCode::CREATED, Json(shipment.into())))
}

/// Fetch one shipment by id
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CreateShipmentResponse>> {
    let shipment_id = freight_types::ShipmentId::new(id.clone());
    let shipment = state
        .store
        .get(&shipment_id)
        .await
        .map_err(freight_engine::EngineError::from)?
        .ok_or_else(|| ApiError::Engine(freight_engine::EngineError::NotFound(id)))?;
    Ok(Json(shipment.into()))
}

/// Track a shipment: refresh from the carrier, then return the canonical view.
pub async fn track_shipment(
    State(state): State<AppState>,
    Path(tracking_number): Path<String>,
) -> ApiResult<Json<TrackShipmentResponse>> {
    let tracking = TrackingNumber::new(tracking_number);
    let outcome = state.poller.refresh_by_tracking(&tracking).await?;

    Ok(Json(TrackShipmentResponse {
        tracking_number: tracking.to_string(),
        carrier: outcome.shipment.carrier.0.clone(),
        status: outcome.shipment.status,
        estimated_delivery: None,
        events: outcome
            .events
            .into_iter()
            .map(TrackingEventPayload::from)
            .collect(),
    }))
}
