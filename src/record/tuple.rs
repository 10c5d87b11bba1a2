//! Directional connection tuples

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::attr::Attr;

/// View of a connection's tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Initiator to responder
    Original = 0,
    /// Responder to initiator
    Reply = 1,
    /// Master connection of an expectation
    Master = 2,
}

/// Number of tuple slots in a record
pub const DIR_MAX: usize = 3;

impl Direction {
    pub const ALL: [Direction; DIR_MAX] = [Direction::Original, Direction::Reply, Direction::Master];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Original => "original",
            Direction::Reply => "reply",
            Direction::Master => "master",
        }
    }

    /// Attribute ids backing the tuple fields of this direction
    pub(crate) fn tuple_attrs(self) -> &'static TupleAttrs {
        match self {
            Direction::Original => &ORIG_ATTRS,
            Direction::Reply => &REPL_ATTRS,
            Direction::Master => &MASTER_ATTRS,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) struct TupleAttrs {
    pub ipv4_src: Attr,
    pub ipv4_dst: Attr,
    pub ipv6_src: Attr,
    pub ipv6_dst: Attr,
    pub port_src: Attr,
    pub port_dst: Attr,
    pub l3proto: Attr,
    pub l4proto: Attr,
    /// correction position, offset before, offset after
    pub natseq: Option<[Attr; 3]>,
}

static ORIG_ATTRS: TupleAttrs = TupleAttrs {
    ipv4_src: Attr::OrigIpv4Src,
    ipv4_dst: Attr::OrigIpv4Dst,
    ipv6_src: Attr::OrigIpv6Src,
    ipv6_dst: Attr::OrigIpv6Dst,
    port_src: Attr::OrigPortSrc,
    port_dst: Attr::OrigPortDst,
    l3proto: Attr::OrigL3Proto,
    l4proto: Attr::OrigL4Proto,
    natseq: Some([
        Attr::OrigNatSeqCorrectionPos,
        Attr::OrigNatSeqOffsetBefore,
        Attr::OrigNatSeqOffsetAfter,
    ]),
};

static REPL_ATTRS: TupleAttrs = TupleAttrs {
    ipv4_src: Attr::ReplIpv4Src,
    ipv4_dst: Attr::ReplIpv4Dst,
    ipv6_src: Attr::ReplIpv6Src,
    ipv6_dst: Attr::ReplIpv6Dst,
    port_src: Attr::ReplPortSrc,
    port_dst: Attr::ReplPortDst,
    l3proto: Attr::ReplL3Proto,
    l4proto: Attr::ReplL4Proto,
    natseq: Some([
        Attr::ReplNatSeqCorrectionPos,
        Attr::ReplNatSeqOffsetBefore,
        Attr::ReplNatSeqOffsetAfter,
    ]),
};

static MASTER_ATTRS: TupleAttrs = TupleAttrs {
    ipv4_src: Attr::MasterIpv4Src,
    ipv4_dst: Attr::MasterIpv4Dst,
    ipv6_src: Attr::MasterIpv6Src,
    ipv6_dst: Attr::MasterIpv6Dst,
    port_src: Attr::MasterPortSrc,
    port_dst: Attr::MasterPortDst,
    l3proto: Attr::MasterL3Proto,
    l4proto: Attr::MasterL4Proto,
    natseq: None,
};

/// An IPv4 or IPv6 address slot.
///
/// Which variant is meaningful is decided by the tuple's layer 3 protocol
/// and the attribute that wrote it, not by inspecting the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressValue {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl Default for AddressValue {
    fn default() -> Self {
        AddressValue::V4(Ipv4Addr::UNSPECIFIED)
    }
}

impl AddressValue {
    pub fn as_v4(&self) -> Option<Ipv4Addr> {
        match self {
            AddressValue::V4(addr) => Some(*addr),
            AddressValue::V6(_) => None,
        }
    }

    pub fn as_v6(&self) -> Option<Ipv6Addr> {
        match self {
            AddressValue::V6(addr) => Some(*addr),
            AddressValue::V4(_) => None,
        }
    }
}

impl From<AddressValue> for IpAddr {
    fn from(value: AddressValue) -> Self {
        match value {
            AddressValue::V4(a) => IpAddr::V4(a),
            AddressValue::V6(a) => IpAddr::V6(a),
        }
    }
}

/// TCP sequence adjustment applied by NAT helpers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NatSeq {
    pub correction_pos: u32,
    pub offset_before: u32,
    pub offset_after: u32,
}

/// Addresses, protocols and layer 4 selectors of one direction.
///
/// Fields are only meaningful when the owning record has the matching
/// attribute set; read them through [`ConnectionRecord`] accessors.
///
/// [`ConnectionRecord`]: super::ConnectionRecord
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConnectionTuple {
    pub(crate) src: AddressValue,
    pub(crate) dst: AddressValue,
    pub(crate) l3protonum: u8,
    pub(crate) protonum: u8,
    /// TCP/UDP/SCTP source port
    pub(crate) sport: u16,
    /// TCP/UDP/SCTP destination port
    pub(crate) dport: u16,
    pub(crate) icmp_id: u16,
    pub(crate) icmp_type: u8,
    pub(crate) icmp_code: u8,
    pub(crate) natseq: NatSeq,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_attrs() {
        assert_eq!(Direction::Original.tuple_attrs().ipv4_src, Attr::OrigIpv4Src);
        assert_eq!(Direction::Reply.tuple_attrs().l4proto, Attr::ReplL4Proto);
        assert_eq!(Direction::Master.tuple_attrs().port_dst, Attr::MasterPortDst);
        assert!(Direction::Master.tuple_attrs().natseq.is_none());
    }

    #[test]
    fn test_address_value() {
        let v4 = AddressValue::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(v4.as_v4(), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(v4.as_v6(), None);
        assert_eq!(IpAddr::from(v4), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
    }
}
