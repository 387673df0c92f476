use chrono::{SecondsFormat, Utc};

use meridian_core::{ProductId, UserId};
use meridian_infra::config::{AppConfig, Environment, ServiceKind};
use meridian_infra::jobs::{InMemoryJobStore, JobTracker};
use meridian_infra::read_model::InMemoryRecordStore;
use meridian_infra::services::{ProductService, UserService};
use meridian_products::Product;
use meridian_users::User;

use crate::app::dto::ServiceInfoResponse;
use crate::app::health::HealthChecker;

pub type Users = UserService<InMemoryRecordStore<UserId, User>>;
pub type Products = ProductService<InMemoryRecordStore<ProductId, Product>>;
pub type Jobs = JobTracker<InMemoryJobStore>;

/// State shared by the system endpoints of either service.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub name: String,
    pub version: String,
    pub description: &'static str,
    pub environment: Environment,
    pub health: HealthChecker,
}

impl AppServices {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            name: config.service_name.clone(),
            version: config.version.clone(),
            description: match config.service {
                ServiceKind::Users => "User management service",
                ServiceKind::Catalog => "Product catalog and batch processing service",
            },
            environment: config.environment,
            health: HealthChecker::new(config.health.clone(), config.version.clone()),
        }
    }

    pub fn info(&self) -> ServiceInfoResponse {
        ServiceInfoResponse {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description,
            environment: self.environment,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
