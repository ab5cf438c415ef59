pub mod cache;
pub mod client;
pub mod config;
pub mod cookies;
pub mod endpoints;
pub mod errors;
pub mod model;
pub mod net;
pub mod page;
pub mod query;
pub mod session;
pub mod user_agent;

pub use client::{PafClient, PafClientBuilder, ProxyOptions, RefreshOptions, Resolution};
pub use config::ClientConfig;
pub use errors::ClientError;
