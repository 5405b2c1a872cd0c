pub mod related;

mod app_config;
mod catalog;
mod config;
mod scope;

pub use app_config::{AppConfig, ConfigError, Environment};
pub use catalog::{tag_overlap, PriceRange};
pub use config::{load_app_config, load_app_config_from_env};
pub use scope::{Deadline, TenantScope};
