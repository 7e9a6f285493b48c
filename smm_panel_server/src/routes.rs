//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Actix's route attribute macros cannot register generic handlers, so the API handlers are plain generic
//! functions over the engine's trait seams and [`register_api_routes`] wires them up manually. The server
//! registers them with the production types; the endpoint tests register the same handlers over fakes.

use actix_web::{dev::Payload, get, web, FromRequest, HttpRequest, HttpResponse, Responder};
use futures::future::{ready, Ready};
use log::*;
use smm_panel_engine::{
    order_objects::NewOrderRequest,
    traits::{CatalogStore, LedgerDatabase, PanelProvider, RateSource},
    CatalogApi,
    OrderFlowApi,
    PostgresDatabase,
};
use spg_common::Cents;

use crate::{
    data_objects::{OrderQueryParams, PlacementResult, RefundParams},
    errors::ServerError,
    integrations::{PanelClient, RateClient},
};

/// The catalog cache as the server wires it: Postgres overrides, the live panel client and the live FX feed.
pub type CatalogHandle = CatalogApi<PostgresDatabase, PanelClient, RateClient>;
/// The placement coordinator over the same production stack.
pub type OrderFlowHandle = OrderFlowApi<PostgresDatabase, PostgresDatabase, PanelClient, RateClient>;

/// The header the fronting auth proxy injects the caller's id into.
pub const USER_ID_HEADER: &str = "SPG-User-Id";

/// The caller, as vouched for by the upstream proxy. Extraction fails with 401 when the header is missing or
/// not an integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(|id| AuthenticatedUser { id })
            .ok_or(ServerError::UnauthenticatedRequest);
        ready(user)
    }
}

/// Mounts the authenticated API handlers over one choice of backend types. Call inside a scope, e.g.
/// `web::scope("/api").configure(register_api_routes::<PostgresDatabase, ...>)`.
pub fn register_api_routes<B, C, P, R>(cfg: &mut web::ServiceConfig)
where
    B: LedgerDatabase + 'static,
    C: CatalogStore + 'static,
    P: PanelProvider + 'static,
    R: RateSource + 'static,
{
    cfg.service(web::resource("/services").route(web::get().to(services::<C, P, R>)))
        .service(
            web::resource("/orders")
                .route(web::post().to(place_order::<B, C, P, R>))
                .route(web::get().to(my_orders::<B, C, P, R>)),
        )
        .service(web::resource("/orders/{order_id}/cancel").route(web::post().to(cancel_order::<B, C, P, R>)))
        .service(web::resource("/orders/{order_id}/refund").route(web::post().to(refund_order::<B, C, P, R>)));
}

// ----------------------------------------------   Health  ----------------------------------------------------

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("🌐️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------  Catalog  ----------------------------------------------------

pub async fn services<C, P, R>(
    _user: AuthenticatedUser,
    catalog: web::Data<CatalogApi<C, P, R>>,
) -> Result<HttpResponse, ServerError>
where
    C: CatalogStore,
    P: PanelProvider,
    R: RateSource,
{
    let services = catalog.fetch_services().await?;
    debug!("🌐️ Serving {} catalog services", services.len());
    Ok(HttpResponse::Ok().json(services))
}

// ----------------------------------------------   Orders  ----------------------------------------------------

pub async fn place_order<B, C, P, R>(
    user: AuthenticatedUser,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, C, P, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerDatabase,
    C: CatalogStore,
    P: PanelProvider,
    R: RateSource,
{
    let placed = api.place_order(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PlacementResult::from(placed)))
}

pub async fn my_orders<B, C, P, R>(
    user: AuthenticatedUser,
    query: web::Query<OrderQueryParams>,
    api: web::Data<OrderFlowApi<B, C, P, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerDatabase,
    C: CatalogStore,
    P: PanelProvider,
    R: RateSource,
{
    let filter = query.to_filter()?;
    let orders = api.orders_for_user(user.id, filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn cancel_order<B, C, P, R>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, C, P, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerDatabase,
    C: CatalogStore,
    P: PanelProvider,
    R: RateSource,
{
    let canceled = api.cancel_unsubmitted_order(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(canceled))
}

pub async fn refund_order<B, C, P, R>(
    _user: AuthenticatedUser,
    path: web::Path<i64>,
    body: Option<web::Json<RefundParams>>,
    api: web::Data<OrderFlowApi<B, C, P, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerDatabase,
    C: CatalogStore,
    P: PanelProvider,
    R: RateSource,
{
    let amount = body.and_then(|b| b.amount_cents).map(Cents::from);
    if amount.map(|a| !a.is_positive()).unwrap_or(false) {
        return Err(ServerError::InvalidRequestBody("A refund amount must be positive".into()));
    }
    let refund = api.manual_refund(path.into_inner(), amount).await?;
    Ok(HttpResponse::Ok().json(refund))
}

#[cfg(test)]
mod test {
    use actix_web::{http::StatusCode, test, App};

    use super::*;

    #[get("/whoami")]
    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.id.to_string())
    }

    #[actix_web::test]
    async fn health_answers_without_authentication() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
    }

    #[actix_web::test]
    async fn the_user_header_authenticates_requests() {
        let app = test::init_service(App::new().service(whoami)).await;

        let req = test::TestRequest::get().uri("/whoami").insert_header((USER_ID_HEADER, "42")).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "42");
    }

    #[actix_web::test]
    async fn requests_without_the_header_are_unauthorized() {
        let app = test::init_service(App::new().service(whoami)).await;
        let req = test::TestRequest::get().uri("/whoami").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn a_garbage_user_header_is_unauthorized_too() {
        let app = test::init_service(App::new().service(whoami)).await;
        let req = test::TestRequest::get().uri("/whoami").insert_header((USER_ID_HEADER, "alice")).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
