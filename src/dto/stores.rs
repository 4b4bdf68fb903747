use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreList {
    pub items: Vec<Store>,
}
