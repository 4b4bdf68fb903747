use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::lifecycle::OrderAction,
    dto::{
        auth::{
            LoginRequest, LoginResponse, RegisterAgentRequest, RegisterResponse,
            RegisterRetailerRequest, RegisterWholesalerRequest, UpdateProfileRequest,
        },
        catalog::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, ProductList,
            UpdateProductRequest,
        },
        credit::{
            ApproveCreditRequest, CreditLine, CreditLineList, CreditRequestList, MyCredit,
            RequestCreditQuery, RetailerContact, SelfSettleRequest, SettleCreditRequest,
        },
        dashboard::{AgentContact, AgentList, AgentSummary, StatusCounts, WholesalerAnalytics},
        orders::{
            AssignAgentRequest, Invoice, InvoiceLine, OrderLineRequest, OrderList,
            OrderWithItems, PlaceOrderRequest,
        },
        stores::{CreateStoreRequest, StoreList},
    },
    entity::enums::{CreditStatus, OrderStatus, PaymentMethod, PaymentStatus, Role},
    models::{Category, CreditAccount, Order, OrderItem, Product, Store, User},
    response::{ApiResponse, Meta},
    routes::{agent, auth, credit, health, orders, params, stores, wholesaler},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register_wholesaler,
        auth::register_retailer,
        auth::register_agent,
        auth::login,
        auth::me,
        auth::update_me,
        stores::create_store,
        stores::list_stores,
        stores::my_store,
        stores::create_category,
        stores::list_categories,
        stores::create_product,
        stores::list_category_products,
        stores::list_my_products,
        stores::update_product,
        orders::place_order,
        orders::list_my_orders,
        orders::get_order,
        orders::accept_order,
        orders::reject_order,
        orders::assign_agent,
        orders::dispatch_order,
        orders::deliver_order,
        orders::get_invoice,
        wholesaler::list_orders,
        wholesaler::order_summary,
        wholesaler::recent_orders,
        wholesaler::analytics,
        wholesaler::list_agents,
        agent::active_orders,
        agent::delivery_history,
        agent::summary,
        credit::request_credit,
        credit::list_requests,
        credit::list_accounts,
        credit::my_credit,
        credit::approve_credit,
        credit::reject_credit,
        credit::settle_account,
        credit::settle_self
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            PaymentMethod,
            PaymentStatus,
            CreditStatus,
            OrderAction,
            User,
            Store,
            Category,
            Product,
            Order,
            OrderItem,
            CreditAccount,
            RegisterWholesalerRequest,
            RegisterRetailerRequest,
            RegisterAgentRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CreateStoreRequest,
            StoreList,
            CreateCategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            OrderLineRequest,
            PlaceOrderRequest,
            AssignAgentRequest,
            OrderWithItems,
            OrderList,
            InvoiceLine,
            Invoice,
            ApproveCreditRequest,
            RequestCreditQuery,
            SettleCreditRequest,
            SelfSettleRequest,
            RetailerContact,
            CreditRequestList,
            CreditLine,
            CreditLineList,
            MyCredit,
            StatusCounts,
            WholesalerAnalytics,
            AgentContact,
            AgentList,
            AgentSummary,
            params::Pagination,
            params::SortOrder,
            params::OrderListQuery,
            health::HealthData,
            health::ReadinessData,
            Meta,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CreditAccount>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Stores", description = "Wholesaler stores"),
        (name = "Catalog", description = "Categories and products"),
        (name = "Orders", description = "Order placement and lookup"),
        (name = "Fulfillment", description = "Order lifecycle transitions"),
        (name = "Wholesaler", description = "Wholesaler dashboard"),
        (name = "Agent", description = "Delivery agent dashboard"),
        (name = "Credit", description = "Retailer credit lines"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
