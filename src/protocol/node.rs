use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use super::hop::HopRecord;
use super::packet::Packet;
use super::routing_table::RoutingTable;
use super::sync::{RoundSync, RoundVerdict};
use crate::error::{RoutingError, SimulationError};
use crate::network::NetworkRegistry;
use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Idle,
    Broadcasting,
    Draining,
    Relaxing,
}

/// Per-node counters returned when a node task finishes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeOutcome {
    pub id: NodeId,
    pub rounds: usize,
    pub packets_sent: usize,
    pub packets_received: usize,
    pub updates: usize,
}

/// One router of the simulated network.
///
/// The node owns its table and the receive side of its inbox. Neighbor state is only ever
/// learned from received snapshots; the registry is used to find peers and to publish.
pub struct Node {
    table: RoutingTable,
    inbox: UnboundedReceiver<Packet>,
    registry: Arc<NetworkRegistry>,
    state: ActorState,
    outcome: NodeOutcome,
}

impl Node {
    pub fn new(
        table: RoutingTable,
        inbox: UnboundedReceiver<Packet>,
        registry: Arc<NetworkRegistry>,
    ) -> Self {
        let outcome = NodeOutcome {
            id: table.owner().clone(),
            ..NodeOutcome::default()
        };
        Self {
            table,
            inbox,
            registry,
            state: ActorState::Idle,
            outcome,
        }
    }

    pub fn id(&self) -> &NodeId {
        self.table.owner()
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    fn transition(&mut self, next: ActorState) {
        if self.state != next {
            debug!("{}: {:?} -> {:?}", self.id(), self.state, next);
            self.state = next;
        }
    }

    /// Sends a snapshot of the current table to every other registered node.
    pub async fn broadcast(&mut self, round: usize) -> Result<usize, SimulationError> {
        self.transition(ActorState::Broadcasting);

        let packet = Packet::new(self.table.clone(), round);
        let peers = self.registry.peers_of(self.id()).await;

        for peer in &peers {
            peer.inbox
                .send(packet.clone())
                .map_err(|_| SimulationError::InboxClosed(peer.id.clone()))?;
            debug!("{} sent [{}] to {}", self.id(), packet.header, peer.id);
        }

        self.outcome.packets_sent += peers.len();
        Ok(peers.len())
    }

    /// Bellman-Ford relaxation against one received snapshot, using the sender as the via node.
    ///
    /// Returns whether any entry improved. Equal-cost alternatives never replace a route.
    pub fn relax(&mut self, packet: &Packet) -> Result<bool, RoutingError> {
        let via = packet.sender();
        if via == self.id() {
            return Ok(false);
        }

        let to_via = self.table.distance_to(via)?;
        let first_hop = self.table.next_hop_to(via)?.clone();
        let mut edited = false;

        for destination in self.table.destinations() {
            // routing to the sender through the sender cannot beat the direct estimate
            if &destination == via || &destination == self.id() {
                continue;
            }

            let current = self.table.distance_to(&destination)?;
            let via_to_dest = packet.snapshot.distance_to(&destination)?;
            let candidate = to_via + via_to_dest;

            if candidate < current {
                info!(
                    "Updated path from {} to {} via {}: best distance {} -> {}",
                    self.id(),
                    destination,
                    via,
                    current,
                    candidate
                );
                self.table
                    .set(destination, HopRecord::new(first_hop.clone(), candidate)?);
                self.outcome.updates += 1;
                edited = true;
            }
        }

        Ok(edited)
    }

    /// Relaxes against every queued packet in arrival order, then publishes the table.
    pub async fn drain_and_relax(&mut self) -> Result<bool, SimulationError> {
        let mut edited = false;

        loop {
            self.transition(ActorState::Draining);
            let Ok(packet) = self.inbox.try_recv() else {
                break;
            };
            debug!("{} received [{}]", self.id(), packet.header);
            self.outcome.packets_received += 1;

            self.transition(ActorState::Relaxing);
            edited |= self.relax(&packet)?;
        }

        self.registry
            .publish(self.table.owner(), self.table.clone())
            .await?;
        Ok(edited)
    }

    /// Runs synchronized rounds until the whole network is quiet.
    ///
    /// A node broadcasts in the first round and after every round in which its table changed.
    /// All nodes stop in the same round: when no node changed, when any node failed, or when
    /// `max_rounds` is exhausted.
    pub async fn run(
        mut self,
        sync: Arc<RoundSync>,
        max_rounds: usize,
    ) -> Result<NodeOutcome, SimulationError> {
        let mut dirty = true;

        for round in 0..max_rounds {
            let mut fault = None;

            if dirty {
                if let Err(err) = self.broadcast(round).await {
                    fault = Some(err);
                }
            }

            sync.sends_complete(round).await;

            if fault.is_none() {
                match self.drain_and_relax().await {
                    Ok(edited) => {
                        if edited {
                            sync.record_change(round);
                        }
                        dirty = edited;
                    }
                    Err(err) => fault = Some(err),
                }
            }

            if fault.is_some() {
                sync.abort();
            }

            let verdict = sync.round_complete(round).await;
            self.transition(ActorState::Idle);
            self.outcome.rounds = round + 1;

            if let Some(err) = fault {
                error!("{} stopped in round {}: {}", self.id(), round, err);
                return Err(err);
            }

            match verdict {
                RoundVerdict::Continue => {}
                RoundVerdict::Converged => {
                    debug!("{} converged after {} rounds", self.id(), round + 1);
                    return Ok(self.outcome);
                }
                RoundVerdict::Aborted => {
                    warn!("{} halted in round {}: a peer failed", self.id(), round);
                    return Ok(self.outcome);
                }
            }
        }

        Err(SimulationError::NotConverged(max_rounds))
    }
}
