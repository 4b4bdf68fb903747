pub mod audit_logs;
pub mod categories;
pub mod credit_accounts;
pub mod enums;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod stores;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use credit_accounts::Entity as CreditAccounts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use stores::Entity as Stores;
pub use users::Entity as Users;
