use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    entity::enums::OrderStatus,
    error::{AppError, AppResult},
};

/// Actions that move an order through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Accept,
    Reject,
    AssignAgent,
    Dispatch,
    Deliver,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Accept => "accept",
            OrderAction::Reject => "reject",
            OrderAction::AssignAgent => "assign an agent to",
            OrderAction::Dispatch => "dispatch",
            OrderAction::Deliver => "deliver",
        }
    }

    /// The only status this action may start from.
    pub fn required_status(&self) -> OrderStatus {
        match self {
            OrderAction::Accept | OrderAction::Reject => OrderStatus::Pending,
            OrderAction::AssignAgent => OrderStatus::Accepted,
            OrderAction::Dispatch => OrderStatus::Assigned,
            OrderAction::Deliver => OrderStatus::Dispatched,
        }
    }

    pub fn target_status(&self) -> OrderStatus {
        match self {
            OrderAction::Accept => OrderStatus::Accepted,
            OrderAction::Reject => OrderStatus::Rejected,
            OrderAction::AssignAgent => OrderStatus::Assigned,
            OrderAction::Dispatch => OrderStatus::Dispatched,
            OrderAction::Deliver => OrderStatus::Delivered,
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the status an order moves to when `action` is applied to `from`.
pub fn next_status(from: OrderStatus, action: OrderAction) -> AppResult<OrderStatus> {
    if from == action.required_status() {
        Ok(action.target_status())
    } else {
        Err(AppError::InvalidTransition { from, action })
    }
}
