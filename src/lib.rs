//! Connection tracking records, filtering and XML rendering
//!
//! - [`record`]: presence-gated connection and expectation records
//! - [`filter`]: multi-dimension record filter with positive/negative logic
//! - [`xml`]: bounded XML serializer for conntrack events
//! - [`config`]: TOML configuration for filters and output

pub mod attr;
pub mod config;
pub mod error;
pub mod filter;
pub mod presence;
pub mod proto;
pub mod record;
pub mod xml;

pub use attr::{Attr, AttributeId, ExpAttr, FilterDimension};
pub use config::Config;
pub use error::{ConntrackError, Result};
pub use filter::{AddrSlot, FilterEngine, Logic};
pub use presence::PresenceSet;
pub use record::{ConnectionBuilder, ConnectionRecord, Direction, ExpectationRecord, StatusFlags};
pub use xml::{render, render_bounded, render_string, MessageKind};
