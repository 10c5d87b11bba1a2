//! Filter evaluation
//!
//! Each configured dimension is evaluated on its own and the results are
//! ANDed. A dimension with no elements always passes, whatever its logic.
//! A configured dimension fails when the record lacks the attribute it
//! inspects.

use std::net::Ipv4Addr;

use crate::attr::FilterDimension;
use crate::record::{ConnectionRecord, Direction};

use super::engine::{AddrSlot, FilterEngine};

impl FilterEngine {
    /// Does `ct` satisfy every configured dimension?
    pub fn matches(&self, ct: &ConnectionRecord) -> bool {
        self.match_l4proto(ct)
            && self.match_l4proto_state(ct)
            && self.match_address(ct, AddrSlot::Src)
            && self.match_address(ct, AddrSlot::Dst)
    }

    fn match_l4proto(&self, ct: &ConnectionRecord) -> bool {
        if !self.is_configured(FilterDimension::L4Proto) {
            return true;
        }
        let Some(protonum) = ct.l4proto(Direction::Original) else {
            return false;
        };
        self.logic(FilterDimension::L4Proto)
            .apply(self.has_l4proto(protonum))
    }

    fn match_l4proto_state(&self, ct: &ConnectionRecord) -> bool {
        // Only protocols with a non-empty state map are constrained
        let Some(protonum) = ct.l4proto(Direction::Original) else {
            return true;
        };
        let map = self.state_map(protonum);
        if map == 0 {
            return true;
        }
        let Some(state) = ct.l4_state() else {
            return false;
        };
        let member = state < 16 && map & (1 << state) != 0;
        self.logic(FilterDimension::L4ProtoState).apply(member)
    }

    fn match_address(&self, ct: &ConnectionRecord, slot: AddrSlot) -> bool {
        let entries = self.ipv4_entries(slot);
        if entries.is_empty() {
            return true;
        }
        // IPv6 and missing addresses have no 32-bit value to test
        let addr: Option<Ipv4Addr> = match slot {
            AddrSlot::Src => ct.ipv4_src(Direction::Original),
            AddrSlot::Dst => ct.ipv4_dst(Direction::Original),
        };
        let Some(addr) = addr else {
            return false;
        };
        let member = entries.iter().any(|e| e.contains(addr));
        self.logic(slot.dimension()).apply(member)
    }
}
