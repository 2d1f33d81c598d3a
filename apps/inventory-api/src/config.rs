//! Configuration for Inventory API

use core_config::{AppInfo, ConfigError, FromEnv, app_info, server::ServerConfig};
use database::mongodb::MongoConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        let app = app_info!();
        let mongodb = MongoConfig::from_env()?;
        let mongodb = match mongodb.app_name {
            Some(_) => mongodb,
            None => mongodb.with_app_name(app.name),
        };

        Ok(Self {
            app,
            mongodb,
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
        })
    }
}
