pub mod board;
pub mod config;
pub mod error;
pub mod links;
pub mod model;
pub mod notify;
pub mod storage;
pub mod store;
pub mod week;
