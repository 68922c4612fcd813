pub mod health;
pub mod logs;
pub mod metrics;
pub mod reddit;
