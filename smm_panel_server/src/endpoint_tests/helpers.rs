use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use smm_panel_engine::{
    jobs::{side_job_channel, SideJobQueue},
    test_utils::fakes::{FakeLedger, FakePanel, FakeRates, FakeStore},
    CatalogApi,
    CatalogSettings,
    FxRateApi,
    OrderFlowApi,
};

use crate::routes::{register_api_routes, USER_ID_HEADER};

pub const USER: i64 = 11;

/// Builds the API handles the way the server does, over the shared fakes. The fakes are `Arc`-backed, so
/// state written through one request is visible to the next.
pub fn api_handles(
    ledger: &FakeLedger,
    panel: &FakePanel,
) -> (CatalogApi<FakeStore, FakePanel, FakeRates>, OrderFlowApi<FakeLedger, FakeStore, FakePanel, FakeRates>, SideJobQueue)
{
    let fx = FxRateApi::new(FakeRates::quoting(1.0), "USD", 1.0);
    let catalog =
        CatalogApi::new(FakeStore::default(), panel.clone(), fx.clone(), CatalogSettings::new("panel", "USD"));
    let (jobs, queue) = side_job_channel(8);
    let flow = OrderFlowApi::new(ledger.clone(), catalog.clone(), fx, panel.clone(), jobs);
    (catalog, flow, queue)
}

/// Mounts `/api` over the fakes and performs one request, returning the status and body text.
pub async fn send(ledger: &FakeLedger, panel: &FakePanel, req: TestRequest) -> (StatusCode, String) {
    let (catalog, flow, _queue) = api_handles(ledger, panel);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(catalog))
            .app_data(web::Data::new(flow))
            .service(web::scope("/api").configure(register_api_routes::<FakeLedger, FakeStore, FakePanel, FakeRates>)),
    )
    .await;
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

/// Stamps the request with the id the fronting proxy would inject.
pub fn as_user(req: TestRequest) -> TestRequest {
    req.insert_header((USER_ID_HEADER, USER.to_string()))
}
