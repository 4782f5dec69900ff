use std::sync::Arc;

use crate::config::Config;
use crate::gate::AdmissionGate;
use crate::observability::Metrics;
use crate::worker::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        self.dispatcher.gate()
    }

    pub fn metrics(&self) -> &Metrics {
        self.dispatcher.metrics()
    }
}
