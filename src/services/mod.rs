pub mod agent_service;
pub mod auth_service;
pub mod catalog_service;
pub mod credit_service;
pub mod fulfillment_service;
pub mod order_access;
pub mod order_service;
pub mod wholesaler_service;
