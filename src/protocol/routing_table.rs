use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::hop::HopRecord;
use crate::error::RoutingError;
use crate::NodeId;

/// Per-node table mapping every destination to the best known hop.
///
/// The owner's self entry `(owner, 0)` is inserted on construction and is never replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingTable {
    owner: NodeId,
    entries: BTreeMap<NodeId, HopRecord>,
}

impl RoutingTable {
    pub fn new(owner: impl Into<NodeId>) -> Self {
        let owner = owner.into();
        let mut entries = BTreeMap::new();
        entries.insert(owner.clone(), HopRecord::local(owner.clone()));
        Self { owner, entries }
    }

    /// Seeds a table from parsed link data. The first record for a destination wins.
    pub fn from_links<'a>(
        owner: impl Into<NodeId>,
        hops: impl IntoIterator<Item = &'a HopRecord>,
    ) -> Self {
        let mut table = Self::new(owner);
        for hop in hops {
            table
                .entries
                .entry(hop.next_hop().clone())
                .or_insert_with(|| hop.clone());
        }
        table
    }

    pub fn owner(&self) -> &NodeId {
        &self.owner
    }

    pub fn get(&self, destination: &str) -> Result<&HopRecord, RoutingError> {
        self.entries
            .get(destination)
            .ok_or_else(|| RoutingError::UnknownDestination {
                owner: self.owner.clone(),
                destination: destination.to_string(),
            })
    }

    /// Inserts or replaces the record for `destination`.
    ///
    /// Writes to the owner's own entry are ignored; the self entry stays `(owner, 0)`.
    pub fn set(&mut self, destination: impl Into<NodeId>, record: HopRecord) {
        let destination = destination.into();
        if destination == self.owner {
            debug!("{}: ignoring write to self entry ({})", self.owner, record);
            return;
        }
        self.entries.insert(destination, record);
    }

    pub fn distance_to(&self, destination: &str) -> Result<f64, RoutingError> {
        self.get(destination).map(HopRecord::cost)
    }

    pub fn next_hop_to(&self, destination: &str) -> Result<&NodeId, RoutingError> {
        self.get(destination).map(HopRecord::next_hop)
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.entries.contains_key(destination)
    }

    pub fn destinations(&self) -> BTreeSet<NodeId> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &HopRecord)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Makes the table total over `nodes`, adding an unreachable placeholder for
    /// every node not yet present. Returns how many placeholders were added.
    pub fn normalize<'a>(&mut self, nodes: impl IntoIterator<Item = &'a NodeId>) -> usize {
        let mut added = 0;
        for node in nodes {
            if !self.entries.contains_key(node) {
                self.entries
                    .insert(node.clone(), HopRecord::unreachable(node.clone()));
                added += 1;
            }
        }
        added
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (destination, hop) in &self.entries {
            writeln!(f, "  {:<8} {}", destination, hop)?;
        }
        Ok(())
    }
}
