use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, Store};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    /// One of `COD`, `ONLINE`, `CREDIT`; defaults to `COD`.
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignAgentRequest {
    pub agent_email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// Read-only snapshot handed to whatever renders the invoice document.
#[derive(Debug, Serialize, ToSchema)]
pub struct Invoice {
    pub order: Order,
    pub store: Store,
    pub lines: Vec<InvoiceLine>,
    pub total_amount: Decimal,
}
