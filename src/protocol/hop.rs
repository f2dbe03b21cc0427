use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::RoutingError;
use crate::NodeId;

/// Best known way to reach a destination: the neighbor to forward through and the total cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HopRecord {
    next_hop: NodeId,
    #[serde(serialize_with = "serialize_cost")]
    cost: f64,
}

impl HopRecord {
    pub fn new(next_hop: impl Into<NodeId>, cost: f64) -> Result<Self, RoutingError> {
        let next_hop = next_hop.into();
        if cost.is_nan() || cost < 0.0 {
            return Err(RoutingError::InvalidCost { next_hop, cost });
        }
        Ok(Self { next_hop, cost })
    }

    /// Self entry of a table: the owner reaches itself at no cost.
    pub fn local(owner: impl Into<NodeId>) -> Self {
        Self {
            next_hop: owner.into(),
            cost: 0.0,
        }
    }

    /// Placeholder used while a destination has not been reached yet.
    pub fn unreachable(destination: impl Into<NodeId>) -> Self {
        Self {
            next_hop: destination.into(),
            cost: f64::INFINITY,
        }
    }

    pub fn next_hop(&self) -> &NodeId {
        &self.next_hop
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn is_reachable(&self) -> bool {
        self.cost.is_finite()
    }

    /// Parses the link-file token form `(name,cost)`.
    pub fn parse(token: &str) -> Result<Self, RoutingError> {
        let malformed = |reason: &str| RoutingError::MalformedHop {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        let inner = token
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| malformed("expected a parenthesized `(name,cost)` pair"))?;

        let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
        let [name, cost] = fields.as_slice() else {
            return Err(malformed("expected exactly two comma-separated fields"));
        };

        if name.is_empty() {
            return Err(malformed("empty node name"));
        }

        let cost: f64 = cost
            .parse()
            .map_err(|_| malformed("cost is not a number"))?;

        Self::new(*name, cost)
    }
}

impl FromStr for HopRecord {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HopRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reachable() {
            write!(f, "→ {} (cost: {})", self.next_hop, self.cost)
        } else {
            write!(f, "→ {} (unreachable)", self.next_hop)
        }
    }
}

// JSON has no infinity; unreachable costs go out as null.
fn serialize_cost<S: Serializer>(cost: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if cost.is_finite() {
        serializer.serialize_f64(*cost)
    } else {
        serializer.serialize_none()
    }
}
