use sea_orm::entity::prelude::*;

use super::enums::CreditStatus;

/// One credit line per (wholesaler, retailer) pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub wholesaler_id: Uuid,
    pub retailer_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub credit_limit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub credit_used: Decimal,
    pub credit_status: CreditStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::WholesalerId",
        to = "super::users::Column::Id"
    )]
    Wholesaler,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RetailerId",
        to = "super::users::Column::Id"
    )]
    Retailer,
}

impl ActiveModelBehavior for ActiveModel {}
