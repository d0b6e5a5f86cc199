//! HTTP-level tests for the shipping API

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use freight_carriers::{
    BookingConfirmation, CarrierAdapter, CarrierEntry, CarrierError, CarrierErrorKind,
    CarrierRegistry,
};
use freight_daemon::api::create_router;
use freight_daemon::api::rest::state::AppState;
use freight_engine::{
    BookingPolicy, InMemoryShipmentStore, LabelService, QuoteAggregator, TrackingPoller,
};
use freight_types::{
    CarrierId, CarrierProfile, PackageSpec, Quote, Route, ShipmentStatus, TrackingEvent,
    TrackingNumber, TrackingSnapshot,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Fixed-price carrier that books on the first attempt
struct StubCarrier {
    carrier: CarrierId,
    price_minor: i64,
    quote_fails: bool,
}

impl StubCarrier {
    fn new(id: &str, price_minor: i64) -> Arc<Self> {
        Arc::new(Self {
            carrier: CarrierId::new(id),
            price_minor,
            quote_fails: false,
        })
    }

    fn unreachable(id: &str) -> Arc<Self> {
        Arc::new(Self {
            carrier: CarrierId::new(id),
            price_minor: 0,
            quote_fails: true,
        })
    }
}

#[async_trait]
impl CarrierAdapter for StubCarrier {
    fn id(&self) -> CarrierId {
        self.carrier.clone()
    }

    async fn quote(&self, _spec: &PackageSpec, _route: &Route) -> Result<Quote, CarrierError> {
        if self.quote_fails {
            return Err(CarrierError::new(
                self.carrier.clone(),
                CarrierErrorKind::Transport,
                "connection refused",
            ));
        }
        Ok(Quote::priced(self.carrier.clone(), self.price_minor, "AUD"))
    }

    async fn create_shipment(
        &self,
        _spec: &PackageSpec,
        _route: &Route,
    ) -> Result<BookingConfirmation, CarrierError> {
        Ok(BookingConfirmation {
            tracking_number: TrackingNumber::new(format!("{}-TRK-1", self.carrier)),
            label_ref: Some(format!("https://labels.test/{}.pdf", self.carrier)),
            raw: None,
        })
    }

    async fn track(&self, tracking: &TrackingNumber) -> Result<TrackingSnapshot, CarrierError> {
        Ok(TrackingSnapshot {
            status: ShipmentStatus::InTransit,
            events: vec![TrackingEvent {
                timestamp: chrono::Utc::now(),
                status: ShipmentStatus::InTransit,
                location: Some("Sydney NSW".to_string()),
                description: format!("Scanned {}", tracking),
            }],
            raw: None,
        })
    }
}

fn profile(id: &str, priority: u32, max_weight: f64) -> CarrierProfile {
    CarrierProfile {
        id: CarrierId::new(id),
        display_name: id.to_string(),
        max_weight_kg: max_weight,
        max_length_cm: 105.0,
        max_volume_m3: 0.25,
        priority,
    }
}

fn app(adapters: Vec<(CarrierProfile, Arc<dyn CarrierAdapter>)>) -> axum::Router {
    let registry = Arc::new(
        CarrierRegistry::new(
            adapters
                .into_iter()
                .map(|(profile, adapter)| CarrierEntry { profile, adapter })
                .collect(),
        )
        .unwrap(),
    );
    let store = Arc::new(InMemoryShipmentStore::new());
    let aggregator = QuoteAggregator::new(registry.clone(), Duration::from_secs(1));
    let labels = Arc::new(LabelService::new(
        registry.clone(),
        store.clone(),
        aggregator,
        BookingPolicy {
            max_attempts: 2,
            backoff_base: Duration::from_millis(1),
            backoff_cap: Duration::from_millis(2),
            call_timeout: Duration::from_secs(1),
        },
    ));
    let poller = TrackingPoller::new(registry.clone(), store.clone(), Duration::from_secs(1));
    let state = AppState::new(store, labels, poller, registry);
    create_router(state, false)
}

fn create_body(weight: f64) -> Value {
    json!({
        "orderId": "order-1",
        "senderDetails": {
            "name": "Seller",
            "lines": ["1 Example St"],
            "suburb": "Sydney",
            "state": "NSW",
            "postcode": "2000"
        },
        "recipientDetails": {
            "name": "Buyer",
            "lines": ["9 Sample Rd"],
            "suburb": "Melbourne",
            "state": "VIC",
            "postcode": "3000"
        },
        "items": [
            { "weight": weight, "length": 30.0, "width": 20.0, "height": 10.0, "value": 49.95 }
        ]
    })
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn create_returns_booked_shipment() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let (status, body) = post_json(&app, "/shipping/create", create_body(5.0)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["carrier"], "auspost");
    assert_eq!(body["status"], "LABEL_CREATED");
    assert_eq!(body["trackingNumber"], "auspost-TRK-1");
    assert!(body["labelUrl"].as_str().unwrap().ends_with(".pdf"));
    assert!(body["id"].as_str().is_some());
    assert!(body["createdAt"].as_str().is_some());
}

#[tokio::test]
async fn create_is_idempotent_per_order() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let (_, first) = post_json(&app, "/shipping/create", create_body(5.0)).await;
    let (status, second) = post_json(&app, "/shipping/create", create_body(5.0)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["trackingNumber"], second["trackingNumber"]);
}

#[tokio::test]
async fn oversize_package_is_rejected_with_422() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let (status, body) = post_json(&app, "/shipping/create", create_body(40.0)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn unreachable_carriers_surface_as_503() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::unreachable("auspost") as Arc<dyn CarrierAdapter>,
    )]);

    let (status, body) = post_json(&app, "/shipping/create", create_body(5.0)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn empty_item_list_is_a_bad_request() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let mut body = create_body(5.0);
    body["items"] = json!([]);
    let (status, body) = post_json(&app, "/shipping/create", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn malformed_json_body_carries_detail() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/shipping/create")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn track_refreshes_and_reports_events() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let (_, created) = post_json(&app, "/shipping/create", create_body(5.0)).await;
    let tracking = created["trackingNumber"].as_str().unwrap();

    let (status, body) = get_json(&app, &format!("/shipping/track/{}", tracking)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trackingNumber"], tracking);
    assert_eq!(body["carrier"], "auspost");
    assert_eq!(body["status"], "IN_TRANSIT");
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["location"], "Sydney NSW");
}

#[tokio::test]
async fn unknown_tracking_number_is_404() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let (status, body) = get_json(&app, "/shipping/track/NOPE-1").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn get_shipment_by_id_round_trips() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let (_, created) = post_json(&app, "/shipping/create", create_body(5.0)).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = get_json(&app, &format!("/shipping/{}", id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["carrier"], "auspost");
}

#[tokio::test]
async fn health_reports_carrier_count() {
    let app = app(vec![(
        profile("auspost", 1, 22.0),
        StubCarrier::new("auspost", 1095) as Arc<dyn CarrierAdapter>,
    )]);

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["carriers"], 1);
}
