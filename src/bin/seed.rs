use std::str::FromStr;

use b2b_marketplace_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        auth::{RegisterAgentRequest, RegisterRetailerRequest, RegisterWholesalerRequest},
        catalog::{CreateCategoryRequest, CreateProductRequest},
    },
    entity::users::Model as UserModel,
    middleware::auth::AuthUser,
    services::{auth_service, catalog_service, order_access::user_by_email},
    state::AppState,
};
use rust_decimal::Decimal;

const PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;
    let state = AppState::new(pool);

    let wholesaler = match existing(&state, "wholesaler@example.com").await? {
        Some(user) => user,
        None => {
            auth_service::register_wholesaler(
                &state,
                RegisterWholesalerRequest {
                    name: "Asha Traders".into(),
                    business_name: "Asha Wholesale Mart".into(),
                    email: "wholesaler@example.com".into(),
                    phone: "9000000001".into(),
                    address: "12 Market Road".into(),
                    password: PASSWORD.into(),
                },
            )
            .await?;
            required(&state, "wholesaler@example.com").await?
        }
    };

    if existing(&state, "retailer@example.com").await?.is_none() {
        auth_service::register_retailer(
            &state,
            RegisterRetailerRequest {
                name: "Corner Kirana".into(),
                email: "retailer@example.com".into(),
                phone: "9000000002".into(),
                address: "4 Station Street".into(),
                password: PASSWORD.into(),
            },
        )
        .await?;
    }

    if existing(&state, "agent@example.com").await?.is_none() {
        auth_service::register_agent(
            &state,
            RegisterAgentRequest {
                name: "Ravi Delivery".into(),
                email: "agent@example.com".into(),
                phone: "9000000003".into(),
                password: PASSWORD.into(),
            },
        )
        .await?;
    }

    seed_catalog(&state, &wholesaler).await?;

    println!("Seed completed. Password for every account: {PASSWORD}");
    Ok(())
}

async fn existing(state: &AppState, email: &str) -> anyhow::Result<Option<UserModel>> {
    Ok(user_by_email(&state.orm, email).await?)
}

async fn required(state: &AppState, email: &str) -> anyhow::Result<UserModel> {
    existing(state, email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("{email} missing after registration"))
}

async fn seed_catalog(state: &AppState, wholesaler: &UserModel) -> anyhow::Result<()> {
    let owner = AuthUser {
        user_id: wholesaler.id,
        email: wholesaler.email.clone(),
        role: wholesaler.role,
    };
    let store = catalog_service::my_store(state, &owner)
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("wholesaler has no store"))?;

    let categories = catalog_service::list_categories(state, store.id).await?;
    if categories.data.is_some_and(|list| !list.items.is_empty()) {
        println!("Catalog already seeded, skipping");
        return Ok(());
    }

    let catalog = [
        (
            "Grains",
            vec![("Basmati Rice 25kg", "1450.00", "bag", 200, 2), ("Wheat Flour 10kg", "420.50", "bag", 300, 5)],
        ),
        (
            "Beverages",
            vec![("Tea Dust 1kg", "310.00", "pack", 150, 10), ("Instant Coffee 200g", "265.75", "jar", 80, 6)],
        ),
    ];

    for (category_name, products) in catalog {
        let category = catalog_service::create_category(
            state,
            &owner,
            store.id,
            CreateCategoryRequest {
                name: category_name.into(),
            },
        )
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("category {category_name} not created"))?;

        for (name, price, unit, stock, moq) in products {
            catalog_service::create_product(
                state,
                &owner,
                category.id,
                CreateProductRequest {
                    name: name.into(),
                    price: Decimal::from_str(price)?,
                    unit: unit.into(),
                    stock,
                    moq: Some(moq),
                },
            )
            .await?;
        }
    }

    Ok(())
}
