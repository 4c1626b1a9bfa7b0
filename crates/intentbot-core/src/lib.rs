pub mod error;
pub mod types;
pub mod config;
pub mod platform;
pub mod agent;
pub mod provider;
pub mod tool;
pub mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const LOGO: &str = "📱";
