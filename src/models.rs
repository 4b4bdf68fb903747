use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    categories, credit_accounts,
    enums::{CreditStatus, OrderStatus, PaymentMethod, PaymentStatus, Role},
    order_items, orders, products, stores, users,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub business_name: Option<String>,
    pub credit_status: CreditStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub store_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub unit: String,
    pub stock: i32,
    pub moq: i32,
    pub category_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub store_id: Uuid,
    pub retailer_email: String,
    pub agent_email: Option<String>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub credit_status: CreditStatus,
    pub status: OrderStatus,
    pub agent_earnings: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditAccount {
    pub id: Uuid,
    pub wholesaler_id: Uuid,
    pub retailer_id: Uuid,
    pub credit_limit: Decimal,
    pub credit_used: Decimal,
    pub credit_status: CreditStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            role: model.role,
            name: model.name,
            phone: model.phone,
            address: model.address,
            business_name: model.business_name,
            credit_status: model.credit_status,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<stores::Model> for Store {
    fn from(model: stores::Model) -> Self {
        Store {
            id: model.id,
            name: model.name,
            address: model.address,
            owner_email: model.owner_email,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Category {
            id: model.id,
            name: model.name,
            store_id: model.store_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Product {
            id: model.id,
            name: model.name,
            price: model.price,
            unit: model.unit,
            stock: model.stock,
            moq: model.moq,
            category_id: model.category_id,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Order {
            id: model.id,
            store_id: model.store_id,
            retailer_email: model.retailer_email,
            agent_email: model.agent_email,
            total_amount: model.total_amount,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            credit_status: model.credit_status,
            status: model.status,
            agent_earnings: model.agent_earnings,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            price: model.price,
            quantity: model.quantity,
            subtotal: model.subtotal,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<credit_accounts::Model> for CreditAccount {
    fn from(model: credit_accounts::Model) -> Self {
        CreditAccount {
            id: model.id,
            wholesaler_id: model.wholesaler_id,
            retailer_id: model.retailer_id,
            credit_limit: model.credit_limit,
            credit_used: model.credit_used,
            credit_status: model.credit_status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
