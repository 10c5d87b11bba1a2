//! Filter engine storage and construction
//!
//! Built once, then frozen and queried with [`FilterEngine::matches`].

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attr::FilterDimension;
use crate::error::{ConntrackError, Result};
use crate::presence::PresenceSet;
use crate::proto::IPPROTO_MAX;

/// Maximum address/mask pairs per address slot.
///
/// Bounded by the 8-bit jump offsets of the compiled socket filter the
/// kernel-side matcher was generated into.
pub const FILTER_ADDR_MAX: usize = 256;

/// Number of distinct state codes per protocol
pub const FILTER_STATE_MAX: u8 = 16;

/// Whether a dimension accepts members or non-members
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    Positive,
    Negative,
}

impl Logic {
    pub(crate) fn apply(self, member: bool) -> bool {
        match self {
            Logic::Positive => member,
            Logic::Negative => !member,
        }
    }
}

/// Which address of the original tuple an address list applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrSlot {
    Src = 0,
    Dst = 1,
}

impl AddrSlot {
    pub fn dimension(self) -> FilterDimension {
        match self {
            AddrSlot::Src => FilterDimension::SrcIpv4,
            AddrSlot::Dst => FilterDimension::DstIpv4,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// One IPv4 address/mask pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Entry {
    pub addr: Ipv4Addr,
    pub mask: Ipv4Addr,
}

impl Ipv4Entry {
    /// `addr & mask == entry.addr & entry.mask`
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(addr) & mask == u32::from(self.addr) & mask
    }
}

/// Bitmap-encoded selection criteria for connection records
#[derive(Debug, Clone)]
pub struct FilterEngine {
    pub(crate) logic: [Logic; 4],
    pub(crate) l4proto_map: [u32; IPPROTO_MAX / 32],
    pub(crate) l4proto_state: [u16; IPPROTO_MAX],
    pub(crate) l3proto: [Vec<Ipv4Entry>; 2],
    pub(crate) set: PresenceSet<FilterDimension>,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEngine {
    /// Create a filter with no configured dimensions (matches everything)
    pub fn new() -> Self {
        Self {
            logic: [Logic::Positive; 4],
            l4proto_map: [0; IPPROTO_MAX / 32],
            l4proto_state: [0; IPPROTO_MAX],
            l3proto: [Vec::new(), Vec::new()],
            set: PresenceSet::new(),
        }
    }

    pub fn set_logic(&mut self, dim: FilterDimension, logic: Logic) {
        debug!("filter {} logic set to {:?}", dim, logic);
        self.logic[dim as usize] = logic;
    }

    pub fn logic(&self, dim: FilterDimension) -> Logic {
        self.logic[dim as usize]
    }

    /// Has any element been added to `dim`?
    pub fn is_configured(&self, dim: FilterDimension) -> bool {
        self.set.test(dim)
    }

    /// No dimension configured
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Add a layer 4 protocol number
    pub fn add_l4proto(&mut self, protonum: u8) {
        let p = protonum as usize;
        self.l4proto_map[p / 32] |= 1 << (p % 32);
        self.set.set(FilterDimension::L4Proto);
        debug!("filter l4proto += {}", protonum);
    }

    pub fn has_l4proto(&self, protonum: u8) -> bool {
        let p = protonum as usize;
        self.l4proto_map[p / 32] & (1 << (p % 32)) != 0
    }

    /// Add a state code for one layer 4 protocol
    pub fn add_l4proto_state(&mut self, protonum: u8, state: u8) -> Result<()> {
        if state >= FILTER_STATE_MAX {
            warn!(
                "filter rejected state {} for protocol {}: only {} states per protocol",
                state, protonum, FILTER_STATE_MAX
            );
            return Err(ConntrackError::CapacityExceeded {
                what: "protocol state",
                limit: FILTER_STATE_MAX as usize,
            });
        }
        self.l4proto_state[protonum as usize] |= 1 << state;
        self.set.set(FilterDimension::L4ProtoState);
        debug!("filter l4proto {} state += {}", protonum, state);
        Ok(())
    }

    /// 16-bit state map of a protocol
    pub fn state_map(&self, protonum: u8) -> u16 {
        self.l4proto_state[protonum as usize]
    }

    /// Append an IPv4 address/mask pair to a slot
    pub fn add_ipv4(&mut self, slot: AddrSlot, addr: Ipv4Addr, mask: Ipv4Addr) -> Result<()> {
        let entries = &mut self.l3proto[slot.index()];
        if entries.len() >= FILTER_ADDR_MAX {
            warn!(
                "filter rejected {}/{}: {} list is full",
                addr,
                mask,
                slot.dimension()
            );
            return Err(ConntrackError::CapacityExceeded {
                what: "address list",
                limit: FILTER_ADDR_MAX,
            });
        }
        entries.push(Ipv4Entry { addr, mask });
        self.set.set(slot.dimension());
        debug!("filter {} += {}/{}", slot.dimension(), addr, mask);
        Ok(())
    }

    /// Append an address/mask pair of any family; only IPv4 is accepted
    pub fn add_address(&mut self, slot: AddrSlot, addr: IpAddr, mask: IpAddr) -> Result<()> {
        match (addr, mask) {
            (IpAddr::V4(addr), IpAddr::V4(mask)) => self.add_ipv4(slot, addr, mask),
            _ => {
                warn!("filter rejected {}/{}: only IPv4 is supported", addr, mask);
                Err(ConntrackError::UnsupportedFamily("ipv6"))
            }
        }
    }

    pub fn ipv4_entries(&self, slot: AddrSlot) -> &[Ipv4Entry] {
        &self.l3proto[slot.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{IPPROTO_SCTP, IPPROTO_TCP, IPPROTO_UDP};
    use std::net::Ipv6Addr;

    #[test]
    fn test_new_filter_is_empty() {
        let filter = FilterEngine::new();
        assert!(filter.is_empty());
        for dim in FilterDimension::ALL {
            assert_eq!(filter.logic(*dim), Logic::Positive);
            assert!(!filter.is_configured(*dim));
        }
    }

    #[test]
    fn test_l4proto_map() {
        let mut filter = FilterEngine::new();
        filter.add_l4proto(IPPROTO_TCP);
        filter.add_l4proto(IPPROTO_SCTP);
        filter.add_l4proto(255);
        assert!(filter.has_l4proto(IPPROTO_TCP));
        assert!(filter.has_l4proto(IPPROTO_SCTP));
        assert!(filter.has_l4proto(255));
        assert!(!filter.has_l4proto(IPPROTO_UDP));
        assert!(filter.is_configured(FilterDimension::L4Proto));
    }

    #[test]
    fn test_state_map_bound() {
        let mut filter = FilterEngine::new();
        filter.add_l4proto_state(IPPROTO_TCP, 3).unwrap();
        filter.add_l4proto_state(IPPROTO_TCP, 15).unwrap();
        assert_eq!(filter.state_map(IPPROTO_TCP), (1 << 3) | (1 << 15));

        let err = filter.add_l4proto_state(IPPROTO_TCP, 16).unwrap_err();
        assert_eq!(
            err,
            ConntrackError::CapacityExceeded {
                what: "protocol state",
                limit: 16
            }
        );
        assert_eq!(filter.state_map(IPPROTO_TCP), (1 << 3) | (1 << 15));
    }

    #[test]
    fn test_address_capacity() {
        let mut filter = FilterEngine::new();
        for i in 0..FILTER_ADDR_MAX {
            let addr = Ipv4Addr::from(0x0a00_0000 + i as u32);
            filter
                .add_ipv4(AddrSlot::Src, addr, Ipv4Addr::BROADCAST)
                .unwrap();
        }
        assert_eq!(filter.ipv4_entries(AddrSlot::Src).len(), 256);

        let err = filter
            .add_ipv4(AddrSlot::Src, Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::BROADCAST)
            .unwrap_err();
        assert!(matches!(err, ConntrackError::CapacityExceeded { limit: 256, .. }));
        assert_eq!(filter.ipv4_entries(AddrSlot::Src).len(), 256);

        // the other slot has its own budget
        filter
            .add_ipv4(AddrSlot::Dst, Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::BROADCAST)
            .unwrap();
        assert_eq!(filter.ipv4_entries(AddrSlot::Dst).len(), 1);
    }

    #[test]
    fn test_ipv6_rejected() {
        let mut filter = FilterEngine::new();
        let err = filter
            .add_address(
                AddrSlot::Dst,
                IpAddr::V6(Ipv6Addr::LOCALHOST),
                IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            )
            .unwrap_err();
        assert_eq!(err, ConntrackError::UnsupportedFamily("ipv6"));
        assert!(!filter.is_configured(FilterDimension::DstIpv4));
        assert!(filter.ipv4_entries(AddrSlot::Dst).is_empty());
    }

    #[test]
    fn test_entry_contains() {
        let entry = Ipv4Entry {
            addr: Ipv4Addr::new(192, 168, 1, 77),
            mask: Ipv4Addr::new(255, 255, 255, 0),
        };
        assert!(entry.contains(Ipv4Addr::new(192, 168, 1, 5)));
        assert!(!entry.contains(Ipv4Addr::new(192, 168, 2, 5)));
    }
}
