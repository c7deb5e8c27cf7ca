use crate::config::Config;
use crate::forwarder::PayloadForwarder;
use crate::receiver::RequestReceiver;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub receiver: Arc<RequestReceiver>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let forwarder = PayloadForwarder::new(config.forwarder_config()?)?;
        let forwarder_config = forwarder.config();
        info!(
            api_url = %forwarder_config.api_url,
            request_timeout = ?forwarder_config.request_timeout,
            connect_timeout = ?forwarder_config.connect_timeout,
            "Forwarder configured"
        );

        Ok(Self::from_receiver(RequestReceiver::new(forwarder)))
    }

    pub fn from_receiver(receiver: RequestReceiver) -> Self {
        Self {
            receiver: Arc::new(receiver),
        }
    }
}
