//! Upstream service traits split by responsibility
//!
//! - [`IdentityApi`] - delegated credentials for a target account
//! - [`InventoryApi`] - image listing and launch-permission lookups

mod identity;
mod inventory;

pub use identity::IdentityApi;
pub use inventory::InventoryApi;
