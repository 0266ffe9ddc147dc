pub mod health;
pub mod proto;
