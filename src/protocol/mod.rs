pub mod hop;
pub mod node;
pub mod packet;
pub mod routing_table;
pub mod sync;

pub use hop::HopRecord;
pub use node::{ActorState, Node, NodeOutcome};
pub use packet::{Packet, PacketHeader};
pub use routing_table::RoutingTable;
pub use sync::{RoundSync, RoundVerdict};
