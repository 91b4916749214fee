//! Domain models for the admin directory.

pub mod user;

pub use user::{
    Address, IdentityProfile, NewUser, OrderAggregates, OrderSummary, PageRequest, UserAccount,
    UserChanges, UserDetail, UserFilter, UserPage, UserSummary,
};
