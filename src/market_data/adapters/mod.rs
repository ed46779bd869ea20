pub mod search_bridge;
pub mod yahoo;
