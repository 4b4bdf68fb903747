use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::enums::Role,
    models::{Store, User},
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterWholesalerRequest {
    pub name: String,
    pub business_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRetailerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterAgentRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    /// Present for wholesalers, whose store is created with the account.
    pub store: Option<Store>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub business_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}
