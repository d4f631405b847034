pub mod health;
pub mod items;
pub mod metrics;
pub mod models;
pub mod recommend;
pub mod tryon;
