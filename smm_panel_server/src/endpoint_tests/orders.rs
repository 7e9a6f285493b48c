use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use smm_panel_engine::test_utils::fakes::{reel_views, FakeLedger, FakePanel};
use spg_common::Cents;

use super::helpers::{as_user, send, USER};

fn placement_body() -> Value {
    json!({ "serviceId": "panel:2493", "quantity": 1000, "link": "https://example.com/p/1" })
}

#[actix_web::test]
async fn placing_an_order_charges_the_wallet_and_submits() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    panel.accept_orders_with_id("910551");

    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (status, body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["submitted"], json!(true));
    assert_eq!(result["order"]["status"], json!("submitted"));
    assert_eq!(result["order"]["provider_order_id"], json!("910551"));
    assert_eq!(result["order"]["amount_cents"], json!(250));
    assert_eq!(ledger.balance(USER), Cents::from(9_750));
}

#[actix_web::test]
async fn a_panel_rejection_is_still_a_200_with_the_rejection_text() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    panel.reject_orders("neworder.error.not_enough_funds");

    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (status, body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["submitted"], json!(false));
    assert_eq!(result["error"], json!("neworder.error.not_enough_funds"));
    // The charge has already been reversed.
    assert_eq!(ledger.balance(USER), Cents::from(10_000));
}

#[actix_web::test]
async fn placing_an_order_requires_the_user_header() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);

    let req = TestRequest::post().uri("/api/orders").set_json(placement_body());
    let (status, body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert!(result["error"].is_string());
    assert_eq!(ledger.balance(USER), Cents::from(10_000));
}

#[actix_web::test]
async fn an_empty_wallet_is_a_payment_required_response() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(100));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    panel.accept_orders_with_id("910551");

    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (status, _body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(ledger.balance(USER), Cents::from(100));
}

#[actix_web::test]
async fn an_unknown_service_is_a_bad_request() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);

    let body = json!({ "serviceId": "panel:9999", "quantity": 1000, "link": "https://example.com/p/1" });
    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(body);
    let (status, _body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn an_unsubmitted_order_cancels_once_and_only_once() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    // Accepted, but without a usable panel id; the order stays cancellable.
    panel.accept_orders_with_id("");

    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (_, body) = send(&ledger, &panel, req).await;
    let result: Value = serde_json::from_str(&body).unwrap();
    let order_id = result["order"]["id"].as_i64().unwrap();

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")));
    let (status, body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::OK);
    let canceled: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(canceled["refunded"], json!(250));
    assert_eq!(ledger.balance(USER), Cents::from(10_000));

    // A second cancel finds a finalized order.
    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")));
    let (status, _) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn a_submitted_order_refuses_the_user_cancel() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    panel.accept_orders_with_id("910551");

    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (_, body) = send(&ledger, &panel, req).await;
    let result: Value = serde_json::from_str(&body).unwrap();
    let order_id = result["order"]["id"].as_i64().unwrap();

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")));
    let (status, _) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(ledger.balance(USER), Cents::from(9_750));
}

#[actix_web::test]
async fn refunds_accept_a_partial_amount_and_cap_at_the_remainder() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    panel.accept_orders_with_id("910551");

    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (_, body) = send(&ledger, &panel, req).await;
    let result: Value = serde_json::from_str(&body).unwrap();
    let order_id = result["order"]["id"].as_i64().unwrap();

    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/refund")))
        .set_json(json!({ "amountCents": 100 }));
    let (status, body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::OK);
    let refund: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(refund["refunded"], json!(100));
    assert_eq!(refund["new_status"], json!("submitted"));

    // No body refunds the remainder and flips the order.
    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/refund")));
    let (status, body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::OK);
    let refund: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(refund["refunded"], json!(150));
    assert_eq!(refund["new_status"], json!("refunded"));
    assert_eq!(ledger.balance(USER), Cents::from(10_000));

    // Nothing left to pay out.
    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/refund")));
    let (status, _) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn a_non_positive_refund_amount_is_a_bad_request() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);

    let req = as_user(TestRequest::post().uri("/api/orders/1/refund")).set_json(json!({ "amountCents": 0 }));
    let (status, _) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn refunding_a_missing_order_is_not_found() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);

    let req = as_user(TestRequest::post().uri("/api/orders/999/refund"));
    let (status, _) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn the_order_listing_honors_the_status_query() {
    let ledger = FakeLedger::with_balance(USER, Cents::from(10_000));
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);
    panel.accept_orders_with_id("910551");
    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (_, _) = send(&ledger, &panel, req).await;
    panel.reject_orders("out of stock");
    let req = as_user(TestRequest::post().uri("/api/orders")).set_json(placement_body());
    let (_, _) = send(&ledger, &panel, req).await;

    let req = as_user(TestRequest::get().uri("/api/orders"));
    let (status, body) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::OK);
    let all: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let req = as_user(TestRequest::get().uri("/api/orders?status=submitted"));
    let (_, body) = send(&ledger, &panel, req).await;
    let submitted: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(submitted.as_array().unwrap().len(), 1);
    assert_eq!(submitted[0]["status"], json!("submitted"));

    // An unknown status name is rejected, not ignored.
    let req = as_user(TestRequest::get().uri("/api/orders?status=paused"));
    let (status, _) = send(&ledger, &panel, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
