pub mod account;
pub mod auth;
pub mod author;
pub mod category;
pub mod favorite;
pub mod kv;
pub mod permission;
pub mod pool;
pub mod skill;

pub use pool::DatabasePool;
