//! Connection tracking records
//!
//! - `ConnectionRecord`: one tracked connection, every field presence-gated
//! - `ExpectationRecord`: master/expected/mask records plus expectation data
//! - `ConnectionBuilder`: chained construction of populated records

pub mod builder;
pub mod conntrack;
pub mod expect;
mod protoinfo;
pub mod tuple;

pub use builder::ConnectionBuilder;
pub use conntrack::{AttrValue, ConnectionRecord, Counters, NatKind, NatRange, StatusFlags};
pub use expect::ExpectationRecord;
pub use tuple::{AddressValue, ConnectionTuple, Direction, NatSeq};
