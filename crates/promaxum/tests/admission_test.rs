//! Tests del limite de scrapes concurrentes.

mod helpers;

use axum::http::StatusCode;
use helpers::{Gate, TestClient, gated};
use promaxum::{HandlerOpts, handler_for};

#[tokio::test]
async fn request_over_limit_is_rejected() {
    let gate = Gate::new();
    let handler = handler_for(
        gated(gate.clone()),
        HandlerOpts::new().max_requests_in_flight(2),
    )
    .unwrap();
    let errors = handler.error_counter().clone();
    let client = TestClient::for_handler(handler);

    let first = client.spawn_get("/metrics");
    let second = client.spawn_get("/metrics");
    gate.wait_for(2).await;

    let rejected = client.get("/metrics").await;
    rejected
        .assert_plain_error(StatusCode::SERVICE_UNAVAILABLE)
        .assert_body_contains("Limit of concurrent requests reached (2), try again later.");

    gate.open();
    first.await.unwrap().assert_status(StatusCode::OK);
    second.await.unwrap().assert_status(StatusCode::OK);

    // Rejections never reach the gatherer or the error counter.
    assert_eq!(gate.entered(), 2);
    assert_eq!(errors.get("gathering"), 0);
    assert_eq!(errors.get("encoding"), 0);
}

#[tokio::test]
async fn slot_is_released_after_completion() {
    let gate = Gate::new();
    gate.open();
    let client = TestClient::for_handler(
        handler_for(gated(gate), HandlerOpts::new().max_requests_in_flight(1)).unwrap(),
    );

    for _ in 0..3 {
        client.get("/metrics").await.assert_status(StatusCode::OK);
    }
}

#[tokio::test]
async fn slot_is_released_after_gather_error() {
    let client = TestClient::for_handler(
        handler_for(
            helpers::failing("down"),
            HandlerOpts::new().max_requests_in_flight(1),
        )
        .unwrap(),
    );

    for _ in 0..3 {
        client
            .get("/metrics")
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}

#[tokio::test]
async fn non_positive_limit_is_unlimited() {
    let gate = Gate::new();
    let client = TestClient::for_handler(
        handler_for(
            gated(gate.clone()),
            HandlerOpts::new().max_requests_in_flight(0),
        )
        .unwrap(),
    );

    let pending: Vec<_> = (0..4).map(|_| client.spawn_get("/metrics")).collect();
    gate.wait_for(4).await;
    gate.open();

    for handle in pending {
        handle.await.unwrap().assert_status(StatusCode::OK);
    }
}
