pub mod registry;
pub mod topology;

pub use registry::{NetworkRegistry, NodeHandle};
pub use topology::{parse_line, parse_links, parse_links_str, validate, LinkMap};
