//! Helpers shared by the demo binaries: a pre-wired orchestrator running
//! against the in-memory store and the local simulator pilot only.

use std::sync::Arc;

use async_trait::async_trait;
use qrelay_domain::Device;
use qrelay_format::FormatRegistry;
use qrelay_orchestrator::{InMemoryStore, Orchestrator, OrchestratorConfig, PilotRegistry, Store};
use qrelay_pilot::Pilot;
use qrelay_pilot_sim::SimPilot;
use qrelay_transpile::TranspileGraph;
use rustc_hash::FxHashMap;

/// Builds an [`Orchestrator`] wired to one provider, `"simulator"`, backed
/// by [`SimPilot`]. Runs synchronously so a demo binary can submit a job
/// and immediately read back its terminal state.
pub async fn build_sync_demo_orchestrator() -> (Orchestrator, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let sim = SimPilot::new();

    let registrar_sink = DeviceSink { store: store.clone() };
    sim.save_devices_from_provider(&registrar_sink, None)
        .await
        .expect("simulator pilot registers its own device");

    let mut pilots: PilotRegistry = FxHashMap::default();
    pilots.insert("simulator".to_string(), Arc::new(sim) as Arc<dyn Pilot>);

    let config = OrchestratorConfig {
        execute_asynchronously: false,
        ..OrchestratorConfig::default()
    };

    let orchestrator = Orchestrator::new(
        store.clone() as Arc<dyn Store>,
        FormatRegistry::new(),
        TranspileGraph::new(),
        pilots,
        config,
    );
    (orchestrator, store)
}

/// The one local device every demo targets.
pub const DEMO_DEVICE: &str = "local_simulator";

struct DeviceSink {
    store: Arc<InMemoryStore>,
}

#[async_trait]
impl qrelay_pilot::DeviceRegistrar for DeviceSink {
    async fn upsert_device(&self, device: Device) -> qrelay_pilot::PilotResult<()> {
        self.store
            .upsert_device(device)
            .await
            .map_err(|e| qrelay_pilot::PilotError::Internal(e.to_string()))
    }
}
