use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Builder;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::network::{self, LinkMap, NetworkRegistry, NodeHandle};
use crate::protocol::{Node, NodeOutcome, RoundSync, RoutingTable};
use crate::{NodeId, DEFAULT_LINKS_FILE};

/// Final state of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub rounds: usize,
    pub packets_sent: usize,
    pub updates: usize,
    pub nodes: Vec<NodeOutcome>,
    pub tables: BTreeMap<NodeId, RoutingTable>,
}

impl SimulationReport {
    pub fn table(&self, id: &str) -> Option<&RoutingTable> {
        self.tables.get(id)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network:")?;
        for (id, table) in &self.tables {
            writeln!(f, "<Router {}>", id)?;
            writeln!(f, "Routing table:")?;
            write!(f, "{}", table)?;
        }
        write!(
            f,
            "Converged after {} rounds ({} packets, {} route updates)",
            self.rounds, self.packets_sent, self.updates
        )
    }
}

/// Builds the network from link data and runs one task per node until convergence.
pub struct Simulation {
    links: LinkMap,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(links: LinkMap, config: SimulationConfig) -> Self {
        Self { links, config }
    }

    pub fn from_file(
        path: impl AsRef<Path>,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        Ok(Self::new(network::parse_links(path)?, config))
    }

    /// Reads `DEFAULT_LINKS_FILE` from the working directory.
    pub fn from_default_file(config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::from_file(DEFAULT_LINKS_FILE, config)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs on a dedicated multi-thread runtime sized to `config.workers`.
    pub fn run_on_pool(self) -> Result<SimulationReport, SimulationError> {
        self.config.validate()?;
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.config.workers)
            .enable_all()
            .build()
            .map_err(SimulationError::Runtime)?;
        runtime.block_on(self.run())
    }

    pub async fn run(self) -> Result<SimulationReport, SimulationError> {
        self.config.validate()?;
        if self.links.is_empty() {
            return Err(SimulationError::EmptyNetwork);
        }
        network::validate(&self.links)?;

        let registry = Arc::new(NetworkRegistry::new());
        let node_ids: Vec<NodeId> = self.links.keys().cloned().collect();
        let mut nodes = Vec::with_capacity(node_ids.len());

        for (name, hops) in &self.links {
            let mut table = RoutingTable::from_links(name.clone(), hops);
            let added = table.normalize(&node_ids);
            debug!("Normalized {}: {} unreachable destinations", name, added);

            let (tx, rx) = mpsc::unbounded_channel();
            registry.put(NodeHandle::new(table.clone(), tx)).await;
            nodes.push((table, rx));
        }

        let max_rounds = self.config.round_limit(registry.node_count().await);
        let sync = Arc::new(RoundSync::new(nodes.len()));
        info!(
            "Starting {} nodes on {} workers (round cap {})",
            nodes.len(),
            self.config.workers,
            max_rounds
        );

        let mut tasks = JoinSet::new();
        for (table, rx) in nodes {
            let node = Node::new(table, rx, registry.clone());
            tasks.spawn(node.run(sync.clone(), max_rounds));
        }

        let mut outcomes = Vec::with_capacity(node_ids.len());
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(SimulationError::from).and_then(|res| res) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        outcomes.sort_by(|a, b| a.id.cmp(&b.id));
        let report = SimulationReport {
            rounds: outcomes.iter().map(|o| o.rounds).max().unwrap_or(0),
            packets_sent: outcomes.iter().map(|o| o.packets_sent).sum(),
            updates: outcomes.iter().map(|o| o.updates).sum(),
            nodes: outcomes,
            tables: registry.snapshot().await,
        };
        info!(
            "Network converged after {} rounds, {} packets sent",
            report.rounds, report.packets_sent
        );
        Ok(report)
    }
}
