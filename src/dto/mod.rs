pub mod auth;
pub mod catalog;
pub mod credit;
pub mod dashboard;
pub mod orders;
pub mod stores;
