use std::sync::Arc;

use crate::{config::Settings, payments::PaymentGateway, service::ServiceContext};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceContext>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        services: Arc<ServiceContext>,
        gateway: Arc<dyn PaymentGateway>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { services, gateway, settings }
    }
}
