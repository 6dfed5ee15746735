//! Pipeline wiring behind the HTTP handlers.

use std::sync::Arc;

use vitalscan_bridge::{BridgeConfig, ProcessBridge, RegistrationService};
use vitalscan_broker::{BrokerClient, RedisStreamBroker};
use vitalscan_jobs::{
    FallbackSimulator, FsJobStore, JobStore, SimulatorConfig, StatusPoller, SubmissionGateway,
};

use crate::config::ApiConfig;

/// Everything the handlers need, built once at startup.
pub struct AppServices {
    pub gateway: SubmissionGateway,
    pub poller: StatusPoller,
    pub registration: RegistrationService,
    pub broker: Arc<dyn BrokerClient>,
    simulator: Arc<FallbackSimulator>,
}

impl AppServices {
    /// Stop background work (the simulator thread). Pending simulations are
    /// abandoned.
    pub fn shutdown(&self) {
        self.simulator.shutdown();
    }
}

/// Production wiring: filesystem store + Redis Streams broker.
pub fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn JobStore> = Arc::new(FsJobStore::open(&config.data_dir)?);
    let broker: Arc<dyn BrokerClient> =
        Arc::new(RedisStreamBroker::new(&config.redis_url, &config.queue)?);

    Ok(assemble(
        store,
        broker,
        SimulatorConfig {
            delay: config.simulator_delay,
        },
        config.bridge.clone(),
    ))
}

/// Assemble services from explicit collaborators.
///
/// This is the injection seam: tests pass an in-memory store and a fake
/// broker, production goes through [`build_services`].
pub fn assemble(
    store: Arc<dyn JobStore>,
    broker: Arc<dyn BrokerClient>,
    simulator_config: SimulatorConfig,
    bridge_config: BridgeConfig,
) -> AppServices {
    let simulator = Arc::new(FallbackSimulator::spawn(store.clone(), simulator_config));

    AppServices {
        gateway: SubmissionGateway::new(broker.clone(), simulator.clone()),
        poller: StatusPoller::new(store),
        registration: RegistrationService::new(ProcessBridge::new(bridge_config)),
        broker,
        simulator,
    }
}
