use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{enums::OrderStatus, users};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub pending: i64,
    pub accepted: i64,
    pub assigned: i64,
    pub dispatched: i64,
    pub delivered: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: OrderStatus, count: i64) {
        let slot = match status {
            OrderStatus::Pending => &mut self.pending,
            OrderStatus::Accepted => &mut self.accepted,
            OrderStatus::Assigned => &mut self.assigned,
            OrderStatus::Dispatched => &mut self.dispatched,
            OrderStatus::Delivered => &mut self.delivered,
            OrderStatus::Rejected => &mut self.rejected,
        };
        *slot += count;
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WholesalerAnalytics {
    pub total_revenue: Decimal,
    pub status_counts: StatusCounts,
    /// Delivered sales keyed by `YYYY-MM`.
    pub monthly_sales: BTreeMap<String, Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<users::Model> for AgentContact {
    fn from(model: users::Model) -> Self {
        AgentContact {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentList {
    pub items: Vec<AgentContact>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct AgentSummary {
    pub active: i64,
    pub delivered: i64,
    pub earnings: Decimal,
    pub week_earnings: Decimal,
    pub month_earnings: Decimal,
}
