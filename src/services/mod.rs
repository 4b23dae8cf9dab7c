pub mod analytics;
pub mod filter;
