use std::collections::{BTreeMap, HashMap};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

use crate::error::RoutingError;
use crate::protocol::{Packet, RoutingTable};
use crate::NodeId;

/// Published view of a node: its latest table and the send side of its inbox.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    pub id: NodeId,
    pub table: RoutingTable,
    pub inbox: UnboundedSender<Packet>,
}

impl NodeHandle {
    pub fn new(table: RoutingTable, inbox: UnboundedSender<Packet>) -> Self {
        Self {
            id: table.owner().clone(),
            table,
            inbox,
        }
    }
}

/// Shared map of every node in the network.
///
/// Used for peer discovery and reporting. Relaxation never reads from it.
#[derive(Debug, Default)]
pub struct NetworkRegistry {
    nodes: RwLock<HashMap<NodeId, NodeHandle>>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<NodeHandle> {
        self.nodes.read().await.get(id).cloned()
    }

    pub async fn put(&self, handle: NodeHandle) {
        self.nodes.write().await.insert(handle.id.clone(), handle);
    }

    /// Replaces the published table of an already registered node.
    pub async fn publish(&self, id: &str, table: RoutingTable) -> Result<(), RoutingError> {
        let mut nodes = self.nodes.write().await;
        match nodes.get_mut(id) {
            Some(handle) => {
                handle.table = table;
                Ok(())
            }
            None => Err(RoutingError::UnknownDestination {
                owner: "registry".to_string(),
                destination: id.to_string(),
            }),
        }
    }

    pub async fn values(&self) -> Vec<NodeHandle> {
        self.nodes.read().await.values().cloned().collect()
    }

    /// Every registered node except `id`.
    pub async fn peers_of(&self, id: &str) -> Vec<NodeHandle> {
        self.nodes
            .read()
            .await
            .values()
            .filter(|handle| handle.id != id)
            .cloned()
            .collect()
    }

    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn snapshot(&self) -> BTreeMap<NodeId, RoutingTable> {
        self.nodes
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.table.clone()))
            .collect()
    }
}
