use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{enums::CreditStatus, users},
    models::CreditAccount,
};

/// Optional target of a credit request; without it the request is open to
/// every wholesaler.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RequestCreditQuery {
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveCreditRequest {
    pub credit_limit: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SettleCreditRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelfSettleRequest {
    pub store_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RetailerContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<users::Model> for RetailerContact {
    fn from(model: users::Model) -> Self {
        RetailerContact {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreditRequestList {
    pub items: Vec<RetailerContact>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreditLine {
    pub credit_account_id: Uuid,
    pub retailer: RetailerContact,
    pub credit_limit: Decimal,
    pub credit_used: Decimal,
    pub available: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreditLineList {
    pub items: Vec<CreditLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyCredit {
    pub credit_status: CreditStatus,
    pub accounts: Vec<CreditAccount>,
    pub total_limit: Decimal,
    pub total_used: Decimal,
}
