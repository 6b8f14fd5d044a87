use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/v1/carts", post(carts::create_cart))
        .route("/v1/carts/{cart_id}/items", post(carts::add_item))
        .route("/v1/checkout", post(checkout::checkout))
        .route("/v1/orders/{order_id}", get(checkout::get_order))
        .route("/v1/products", get(catalog::list_products))
        .route("/v1/products/{product_id}/variants", get(catalog::list_variants))
        .route("/v1/variants/{variant_id}/quote", get(catalog::quote))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
