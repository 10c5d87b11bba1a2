//! Connection record filtering
//!
//! A [`FilterEngine`] selects connection records by:
//! - layer 4 protocol number
//! - layer 4 protocol state (16 codes per protocol)
//! - source and destination IPv4 address/mask lists (up to 256 each)
//!
//! Every dimension has its own positive or negative [`Logic`].
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use conntrack::attr::FilterDimension;
//! use conntrack::filter::{AddrSlot, FilterEngine, Logic};
//! use conntrack::proto::IPPROTO_TCP;
//! use conntrack::record::{ConnectionRecord, Direction};
//!
//! let mut filter = FilterEngine::new();
//! filter.add_l4proto(IPPROTO_TCP);
//! filter
//!     .add_ipv4(AddrSlot::Src, Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(255, 0, 0, 0))
//!     .unwrap();
//! filter.set_logic(FilterDimension::SrcIpv4, Logic::Negative);
//!
//! let ct = ConnectionRecord::builder()
//!     .ipv4(Direction::Original, Ipv4Addr::new(192, 168, 0, 1), Ipv4Addr::new(10, 1, 1, 1))
//!     .ports(Direction::Original, IPPROTO_TCP, 40000, 22)
//!     .build()
//!     .unwrap();
//! assert!(filter.matches(&ct));
//! ```

pub mod engine;
mod matcher;

pub use engine::{AddrSlot, FilterEngine, Ipv4Entry, Logic, FILTER_ADDR_MAX, FILTER_STATE_MAX};
