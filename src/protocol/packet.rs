use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::routing_table::RoutingTable;
use crate::NodeId;

#[derive(Debug, Clone, Serialize)]
pub struct PacketHeader {
    pub id: Uuid,
    pub sender: NodeId,
    pub round: usize,
    pub sent_at: DateTime<Utc>,
}

impl fmt::Display for PacketHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message from: {}. Time: {} (round {}, packet {})",
            self.sender,
            self.sent_at.to_rfc3339(),
            self.round,
            self.id
        )
    }
}

/// A routing-table announcement. The snapshot is an owned copy taken at send time.
#[derive(Debug, Clone, Serialize)]
pub struct Packet {
    pub header: PacketHeader,
    pub snapshot: RoutingTable,
}

impl Packet {
    pub fn new(snapshot: RoutingTable, round: usize) -> Self {
        Self {
            header: PacketHeader {
                id: Uuid::new_v4(),
                sender: snapshot.owner().clone(),
                round,
                sent_at: Utc::now(),
            },
            snapshot,
        }
    }

    pub fn sender(&self) -> &NodeId {
        &self.header.sender
    }
}
