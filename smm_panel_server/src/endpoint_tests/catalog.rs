use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::Value;
use smm_panel_engine::test_utils::fakes::{reel_views, FakeLedger, FakePanel};

use super::helpers::{as_user, send};

#[actix_web::test]
async fn the_catalog_serves_normalized_services() {
    let ledger = FakeLedger::default();
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);

    let (status, body) = send(&ledger, &panel, as_user(TestRequest::get().uri("/api/services"))).await;
    assert_eq!(status, StatusCode::OK);
    let services: Value = serde_json::from_str(&body).unwrap();
    let services = services.as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["id"], Value::from("panel:2493"));
    assert_eq!(services[0]["platform"], Value::from("instagram"));
}

#[actix_web::test]
async fn the_catalog_requires_the_user_header() {
    let ledger = FakeLedger::default();
    let panel = FakePanel::with_services(vec![reel_views(2.50)]);

    let (status, _) = send(&ledger, &panel, TestRequest::get().uri("/api/services")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
