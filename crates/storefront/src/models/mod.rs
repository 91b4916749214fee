//! Storefront read models.

pub mod account;
pub mod catalog;

pub use account::{AccountAddress, AccountOrder, Profile};
pub use catalog::{Category, CategorySummary, Product, ProductFilter, ProductPage};
