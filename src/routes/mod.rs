use axum::Router;

use crate::state::AppState;

pub mod agent;
pub mod auth;
pub mod credit;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod stores;
pub mod wholesaler;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/me", auth::me_router())
        .nest("/stores", stores::stores_router())
        .nest("/categories", stores::categories_router())
        .nest("/products", stores::products_router())
        .nest("/orders", orders::router())
        .nest("/retailer", orders::retailer_router())
        .nest("/invoices", orders::invoice_router())
        .nest("/wholesaler", wholesaler::router())
        .nest("/agent", agent::router())
        .nest("/credit", credit::router())
}
