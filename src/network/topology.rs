use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{RoutingError, SimulationError};
use crate::protocol::HopRecord;
use crate::NodeId;

/// Adjacency data read from a link file: node name to its self entry followed by its links.
pub type LinkMap = BTreeMap<NodeId, Vec<HopRecord>>;

/// Parses one `<name> (<neighbor>,<cost>) ...` line.
///
/// Blank lines and lines holding only a name yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<(NodeId, Vec<HopRecord>)>, RoutingError> {
    let mut fields = line.split_whitespace();
    let Some(name) = fields.next() else {
        return Ok(None);
    };

    let links = fields
        .map(HopRecord::parse)
        .collect::<Result<Vec<_>, _>>()?;
    if links.is_empty() {
        return Ok(None);
    }

    let mut hops = Vec::with_capacity(links.len() + 1);
    hops.push(HopRecord::new(name, 0.0)?);
    hops.extend(links);

    Ok(Some((name.to_string(), hops)))
}

pub fn parse_links_str(text: &str) -> Result<LinkMap, SimulationError> {
    let mut links = LinkMap::new();

    for (index, line) in text.lines().enumerate() {
        let parsed = parse_line(line).map_err(|source| SimulationError::LinkFile {
            line: index + 1,
            source,
        })?;

        match parsed {
            Some((name, hops)) => {
                if links.insert(name.clone(), hops).is_some() {
                    debug!("Line {} redefines node {}", index + 1, name);
                }
            }
            None => debug!("Skipping line {} without links", index + 1),
        }
    }

    Ok(links)
}

pub fn parse_links(path: impl AsRef<Path>) -> Result<LinkMap, SimulationError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SimulationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_links_str(&text)
}

/// Checks that every hop refers to a node defined in the link data.
pub fn validate(links: &LinkMap) -> Result<(), RoutingError> {
    for (name, hops) in links {
        if let Some(hop) = hops.iter().find(|hop| !links.contains_key(hop.next_hop())) {
            return Err(RoutingError::UnknownDestination {
                owner: name.clone(),
                destination: hop.next_hop().clone(),
            });
        }
    }
    Ok(())
}
