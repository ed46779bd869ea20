pub mod asset;
pub mod store;
