pub mod adapters;
pub mod refresh;
pub mod traits;
pub mod types;
