//! Sparse conntrack record
//!
//! A [`ConnectionRecord`] is filled in piece by piece as attributes are
//! decoded. Each setter writes its field and sets the field's presence bit in
//! the same call; each getter returns `None` while the bit is clear.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;

use crate::attr::{Attr, AttributeId};
use crate::error::{ConntrackError, Result};
use crate::presence::PresenceSet;

use super::protoinfo::{ProtocolState, SctpInfo, TcpInfo};
use super::tuple::{AddressValue, ConnectionTuple, Direction, NatSeq, DIR_MAX};

bitflags! {
    /// Connection status bits as reported by the kernel
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u32 {
        /// Connection is an expected connection
        const EXPECTED = 1 << 0;
        /// Packets have been seen in both directions
        const SEEN_REPLY = 1 << 1;
        /// Connection will not be early-dropped
        const ASSURED = 1 << 2;
        const CONFIRMED = 1 << 3;
        const SRC_NAT = 1 << 4;
        const DST_NAT = 1 << 5;
        const SEQ_ADJUST = 1 << 6;
        const SRC_NAT_DONE = 1 << 7;
        const DST_NAT_DONE = 1 << 8;
        const DYING = 1 << 9;
        const FIXED_TIMEOUT = 1 << 10;
    }
}

/// Packet and byte counters of one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Counters {
    pub packets: u64,
    pub bytes: u64,
}

/// Address/port interval used to remap a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NatRange {
    pub min_ip: Ipv4Addr,
    pub max_ip: Ipv4Addr,
    pub min_port: u16,
    pub max_port: u16,
}

impl Default for NatRange {
    fn default() -> Self {
        Self {
            min_ip: Ipv4Addr::UNSPECIFIED,
            max_ip: Ipv4Addr::UNSPECIFIED,
            min_port: 0,
            max_port: 0,
        }
    }
}

/// Which NAT range of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NatKind {
    Source,
    Destination,
}

impl NatKind {
    fn attrs(self) -> (Attr, Attr) {
        match self {
            NatKind::Source => (Attr::SnatIpv4, Attr::SnatPort),
            NatKind::Destination => (Attr::DnatIpv4, Attr::DnatPort),
        }
    }
}

/// Value of a single attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::U8(v) => write!(f, "{}", v),
            AttrValue::U16(v) => write!(f, "{}", v),
            AttrValue::U32(v) => write!(f, "{}", v),
            AttrValue::U64(v) => write!(f, "{}", v),
            AttrValue::Ipv4(v) => write!(f, "{}", v),
            AttrValue::Ipv6(v) => write!(f, "{}", v),
        }
    }
}

fn addr_value(addr: AddressValue) -> AttrValue {
    match addr {
        AddressValue::V4(a) => AttrValue::Ipv4(a),
        AddressValue::V6(a) => AttrValue::Ipv6(a),
    }
}

fn invalid(attribute: &'static str, dir: Direction) -> ConntrackError {
    ConntrackError::InvalidAttribute {
        attribute,
        direction: dir.name(),
    }
}

fn counter_attrs(dir: Direction) -> Result<(Attr, Attr)> {
    match dir {
        Direction::Original => Ok((Attr::OrigCounterPackets, Attr::OrigCounterBytes)),
        Direction::Reply => Ok((Attr::ReplCounterPackets, Attr::ReplCounterBytes)),
        Direction::Master => Err(invalid("counters", dir)),
    }
}

fn tcp_flag_attrs(dir: Direction) -> Result<(Attr, Attr)> {
    match dir {
        Direction::Original => Ok((Attr::TcpFlagsOrig, Attr::TcpMaskOrig)),
        Direction::Reply => Ok((Attr::TcpFlagsRepl, Attr::TcpMaskRepl)),
        Direction::Master => Err(invalid("tcp-flags", dir)),
    }
}

fn sctp_vtag_attr(dir: Direction) -> Result<Attr> {
    match dir {
        Direction::Original => Ok(Attr::SctpVtagOrig),
        Direction::Reply => Ok(Attr::SctpVtagRepl),
        Direction::Master => Err(invalid("sctp-vtag", dir)),
    }
}

/// A tracked connection with presence-gated fields
#[derive(Clone)]
pub struct ConnectionRecord {
    tuple: [ConnectionTuple; DIR_MAX],
    timeout: u32,
    mark: u32,
    secmark: u32,
    status: StatusFlags,
    use_count: u32,
    id: u32,
    protoinfo: ProtocolState,
    /// Original and reply only
    counters: [Counters; 2],
    snat: NatRange,
    dnat: NatRange,
    set: PresenceSet<Attr>,
}

impl Default for ConnectionRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self {
            tuple: [ConnectionTuple::default(); DIR_MAX],
            timeout: 0,
            mark: 0,
            secmark: 0,
            status: StatusFlags::empty(),
            use_count: 0,
            id: 0,
            protoinfo: ProtocolState::None,
            counters: [Counters::default(); 2],
            snat: NatRange::default(),
            dnat: NatRange::default(),
            set: PresenceSet::new(),
        }
    }

    // ========================================================================
    // Presence
    // ========================================================================

    pub fn is_set(&self, attr: Attr) -> bool {
        self.set.test(attr)
    }

    pub fn presence(&self) -> &PresenceSet<Attr> {
        &self.set
    }

    /// Fail with `PresenceViolation` unless `attr` is populated
    pub fn require(&self, attr: Attr) -> Result<()> {
        if self.set.test(attr) {
            Ok(())
        } else {
            Err(ConntrackError::PresenceViolation(attr.name()))
        }
    }

    /// Unset one attribute
    pub fn clear(&mut self, attr: Attr) {
        self.set.clear(attr);
    }

    /// Unset every attribute
    pub fn clear_all(&mut self) {
        self.set.clear_all();
    }

    fn gated<T>(&self, attr: Attr, value: T) -> Option<T> {
        self.set.test(attr).then_some(value)
    }

    fn tuple_mut(&mut self, dir: Direction) -> &mut ConnectionTuple {
        &mut self.tuple[dir.index()]
    }

    fn tuple(&self, dir: Direction) -> &ConnectionTuple {
        &self.tuple[dir.index()]
    }

    // ========================================================================
    // Tuples
    // ========================================================================

    pub fn set_ipv4_src(&mut self, dir: Direction, addr: Ipv4Addr) {
        let attrs = dir.tuple_attrs();
        self.tuple_mut(dir).src = AddressValue::V4(addr);
        self.set.clear(attrs.ipv6_src);
        self.set.set(attrs.ipv4_src);
    }

    pub fn set_ipv4_dst(&mut self, dir: Direction, addr: Ipv4Addr) {
        let attrs = dir.tuple_attrs();
        self.tuple_mut(dir).dst = AddressValue::V4(addr);
        self.set.clear(attrs.ipv6_dst);
        self.set.set(attrs.ipv4_dst);
    }

    pub fn set_ipv6_src(&mut self, dir: Direction, addr: Ipv6Addr) {
        let attrs = dir.tuple_attrs();
        self.tuple_mut(dir).src = AddressValue::V6(addr);
        self.set.clear(attrs.ipv4_src);
        self.set.set(attrs.ipv6_src);
    }

    pub fn set_ipv6_dst(&mut self, dir: Direction, addr: Ipv6Addr) {
        let attrs = dir.tuple_attrs();
        self.tuple_mut(dir).dst = AddressValue::V6(addr);
        self.set.clear(attrs.ipv4_dst);
        self.set.set(attrs.ipv6_dst);
    }

    pub fn ipv4_src(&self, dir: Direction) -> Option<Ipv4Addr> {
        self.gated(dir.tuple_attrs().ipv4_src, self.tuple(dir).src)
            .and_then(|a| a.as_v4())
    }

    pub fn ipv4_dst(&self, dir: Direction) -> Option<Ipv4Addr> {
        self.gated(dir.tuple_attrs().ipv4_dst, self.tuple(dir).dst)
            .and_then(|a| a.as_v4())
    }

    pub fn ipv6_src(&self, dir: Direction) -> Option<Ipv6Addr> {
        self.gated(dir.tuple_attrs().ipv6_src, self.tuple(dir).src)
            .and_then(|a| a.as_v6())
    }

    pub fn ipv6_dst(&self, dir: Direction) -> Option<Ipv6Addr> {
        self.gated(dir.tuple_attrs().ipv6_dst, self.tuple(dir).dst)
            .and_then(|a| a.as_v6())
    }

    /// Source address of either family
    pub fn src_addr(&self, dir: Direction) -> Option<AddressValue> {
        let attrs = dir.tuple_attrs();
        self.set
            .test_any(&[attrs.ipv4_src, attrs.ipv6_src])
            .then_some(self.tuple(dir).src)
    }

    /// Destination address of either family
    pub fn dst_addr(&self, dir: Direction) -> Option<AddressValue> {
        let attrs = dir.tuple_attrs();
        self.set
            .test_any(&[attrs.ipv4_dst, attrs.ipv6_dst])
            .then_some(self.tuple(dir).dst)
    }

    pub fn set_port_src(&mut self, dir: Direction, port: u16) {
        self.tuple_mut(dir).sport = port;
        self.set.set(dir.tuple_attrs().port_src);
    }

    pub fn set_port_dst(&mut self, dir: Direction, port: u16) {
        self.tuple_mut(dir).dport = port;
        self.set.set(dir.tuple_attrs().port_dst);
    }

    pub fn port_src(&self, dir: Direction) -> Option<u16> {
        self.gated(dir.tuple_attrs().port_src, self.tuple(dir).sport)
    }

    pub fn port_dst(&self, dir: Direction) -> Option<u16> {
        self.gated(dir.tuple_attrs().port_dst, self.tuple(dir).dport)
    }

    pub fn set_l3proto(&mut self, dir: Direction, protonum: u8) {
        self.tuple_mut(dir).l3protonum = protonum;
        self.set.set(dir.tuple_attrs().l3proto);
    }

    pub fn set_l4proto(&mut self, dir: Direction, protonum: u8) {
        self.tuple_mut(dir).protonum = protonum;
        self.set.set(dir.tuple_attrs().l4proto);
    }

    pub fn l3proto(&self, dir: Direction) -> Option<u8> {
        self.gated(dir.tuple_attrs().l3proto, self.tuple(dir).l3protonum)
    }

    pub fn l4proto(&self, dir: Direction) -> Option<u8> {
        self.gated(dir.tuple_attrs().l4proto, self.tuple(dir).protonum)
    }

    /// Set all three NAT sequence adjustment fields of a direction
    pub fn set_nat_seq(&mut self, dir: Direction, seq: NatSeq) -> Result<()> {
        let attrs = dir
            .tuple_attrs()
            .natseq
            .ok_or_else(|| invalid("nat-seq", dir))?;
        self.tuple_mut(dir).natseq = seq;
        for attr in attrs {
            self.set.set(attr);
        }
        Ok(())
    }

    /// NAT sequence adjustment, present only when all three fields are set
    pub fn nat_seq(&self, dir: Direction) -> Option<NatSeq> {
        let attrs = dir.tuple_attrs().natseq?;
        self.set
            .test_all(&attrs)
            .then_some(self.tuple(dir).natseq)
    }

    // ICMP selectors live in the original tuple

    pub fn set_icmp_type(&mut self, kind: u8) {
        self.tuple_mut(Direction::Original).icmp_type = kind;
        self.set.set(Attr::IcmpType);
    }

    pub fn set_icmp_code(&mut self, code: u8) {
        self.tuple_mut(Direction::Original).icmp_code = code;
        self.set.set(Attr::IcmpCode);
    }

    pub fn set_icmp_id(&mut self, id: u16) {
        self.tuple_mut(Direction::Original).icmp_id = id;
        self.set.set(Attr::IcmpId);
    }

    pub fn icmp_type(&self) -> Option<u8> {
        self.gated(Attr::IcmpType, self.tuple(Direction::Original).icmp_type)
    }

    pub fn icmp_code(&self) -> Option<u8> {
        self.gated(Attr::IcmpCode, self.tuple(Direction::Original).icmp_code)
    }

    pub fn icmp_id(&self) -> Option<u16> {
        self.gated(Attr::IcmpId, self.tuple(Direction::Original).icmp_id)
    }

    /// Derive the reply tuple from the original one by swapping endpoints
    pub fn setup_reply(&mut self) {
        let orig = *self.tuple(Direction::Original);
        let repl = self.tuple_mut(Direction::Reply);
        repl.src = orig.dst;
        repl.dst = orig.src;
        repl.l3protonum = orig.l3protonum;
        repl.protonum = orig.protonum;
        repl.sport = orig.dport;
        repl.dport = orig.sport;

        let mirrored = [
            (Attr::OrigIpv4Src, Attr::ReplIpv4Dst),
            (Attr::OrigIpv4Dst, Attr::ReplIpv4Src),
            (Attr::OrigIpv6Src, Attr::ReplIpv6Dst),
            (Attr::OrigIpv6Dst, Attr::ReplIpv6Src),
            (Attr::OrigPortSrc, Attr::ReplPortDst),
            (Attr::OrigPortDst, Attr::ReplPortSrc),
            (Attr::OrigL3Proto, Attr::ReplL3Proto),
            (Attr::OrigL4Proto, Attr::ReplL4Proto),
        ];
        for (from, to) in mirrored {
            if self.set.test(from) {
                self.set.set(to);
            } else {
                self.set.clear(to);
            }
        }
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
        self.set.set(Attr::Timeout);
    }

    pub fn timeout(&self) -> Option<u32> {
        self.gated(Attr::Timeout, self.timeout)
    }

    pub fn set_mark(&mut self, mark: u32) {
        self.mark = mark;
        self.set.set(Attr::Mark);
    }

    pub fn mark(&self) -> Option<u32> {
        self.gated(Attr::Mark, self.mark)
    }

    pub fn set_secmark(&mut self, secmark: u32) {
        self.secmark = secmark;
        self.set.set(Attr::Secmark);
    }

    pub fn secmark(&self) -> Option<u32> {
        self.gated(Attr::Secmark, self.secmark)
    }

    /// Reference count held by the kernel
    pub fn set_use(&mut self, use_count: u32) {
        self.use_count = use_count;
        self.set.set(Attr::Use);
    }

    pub fn use_count(&self) -> Option<u32> {
        self.gated(Attr::Use, self.use_count)
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
        self.set.set(Attr::Id);
    }

    pub fn id(&self) -> Option<u32> {
        self.gated(Attr::Id, self.id)
    }

    pub fn set_status(&mut self, status: StatusFlags) {
        self.status = status;
        self.set.set(Attr::Status);
    }

    pub fn status(&self) -> Option<StatusFlags> {
        self.gated(Attr::Status, self.status)
    }

    // ========================================================================
    // Counters
    // ========================================================================

    pub fn set_packets(&mut self, dir: Direction, packets: u64) -> Result<()> {
        let (attr, _) = counter_attrs(dir)?;
        self.counters[dir.index()].packets = packets;
        self.set.set(attr);
        Ok(())
    }

    pub fn set_bytes(&mut self, dir: Direction, bytes: u64) -> Result<()> {
        let (_, attr) = counter_attrs(dir)?;
        self.counters[dir.index()].bytes = bytes;
        self.set.set(attr);
        Ok(())
    }

    pub fn set_counters(&mut self, dir: Direction, counters: Counters) -> Result<()> {
        self.set_packets(dir, counters.packets)?;
        self.set_bytes(dir, counters.bytes)
    }

    pub fn packets(&self, dir: Direction) -> Option<u64> {
        let (attr, _) = counter_attrs(dir).ok()?;
        self.gated(attr, self.counters[dir.index()].packets)
    }

    pub fn bytes(&self, dir: Direction) -> Option<u64> {
        let (_, attr) = counter_attrs(dir).ok()?;
        self.gated(attr, self.counters[dir.index()].bytes)
    }

    /// Both counters of a direction, only if both are set
    pub fn counters(&self, dir: Direction) -> Option<Counters> {
        let (packets, bytes) = counter_attrs(dir).ok()?;
        self.set
            .test_all(&[packets, bytes])
            .then_some(self.counters[dir.index()])
    }

    // ========================================================================
    // Protocol state
    // ========================================================================

    fn update_tcp(&mut self, f: impl FnOnce(&mut TcpInfo)) {
        let mut info = match self.protoinfo {
            ProtocolState::Tcp(info) => info,
            _ => {
                for attr in Attr::SCTP_STATE_ATTRS {
                    self.set.clear(*attr);
                }
                TcpInfo::default()
            }
        };
        f(&mut info);
        self.protoinfo = ProtocolState::Tcp(info);
    }

    fn update_sctp(&mut self, f: impl FnOnce(&mut SctpInfo)) {
        let mut info = match self.protoinfo {
            ProtocolState::Sctp(info) => info,
            _ => {
                for attr in Attr::TCP_STATE_ATTRS {
                    self.set.clear(*attr);
                }
                SctpInfo::default()
            }
        };
        f(&mut info);
        self.protoinfo = ProtocolState::Sctp(info);
    }

    pub fn set_tcp_state(&mut self, state: u8) {
        self.update_tcp(|t| t.state = state);
        self.set.set(Attr::TcpState);
    }

    pub fn tcp_state(&self) -> Option<u8> {
        let info = self.protoinfo.tcp()?;
        self.gated(Attr::TcpState, info.state)
    }

    pub fn set_tcp_flags(&mut self, dir: Direction, value: u8) -> Result<()> {
        let (attr, _) = tcp_flag_attrs(dir)?;
        self.update_tcp(|t| t.flags[dir.index()].value = value);
        self.set.set(attr);
        Ok(())
    }

    pub fn set_tcp_mask(&mut self, dir: Direction, mask: u8) -> Result<()> {
        let (_, attr) = tcp_flag_attrs(dir)?;
        self.update_tcp(|t| t.flags[dir.index()].mask = mask);
        self.set.set(attr);
        Ok(())
    }

    pub fn tcp_flags(&self, dir: Direction) -> Option<u8> {
        let (attr, _) = tcp_flag_attrs(dir).ok()?;
        let info = self.protoinfo.tcp()?;
        self.gated(attr, info.flags[dir.index()].value)
    }

    pub fn tcp_mask(&self, dir: Direction) -> Option<u8> {
        let (_, attr) = tcp_flag_attrs(dir).ok()?;
        let info = self.protoinfo.tcp()?;
        self.gated(attr, info.flags[dir.index()].mask)
    }

    pub fn set_sctp_state(&mut self, state: u8) {
        self.update_sctp(|s| s.state = state);
        self.set.set(Attr::SctpState);
    }

    pub fn sctp_state(&self) -> Option<u8> {
        let info = self.protoinfo.sctp()?;
        self.gated(Attr::SctpState, info.state)
    }

    pub fn set_sctp_vtag(&mut self, dir: Direction, vtag: u32) -> Result<()> {
        let attr = sctp_vtag_attr(dir)?;
        self.update_sctp(|s| s.vtag[dir.index()] = vtag);
        self.set.set(attr);
        Ok(())
    }

    pub fn sctp_vtag(&self, dir: Direction) -> Option<u32> {
        let attr = sctp_vtag_attr(dir).ok()?;
        let info = self.protoinfo.sctp()?;
        self.gated(attr, info.vtag[dir.index()])
    }

    /// Current layer 4 state code, whichever protocol carries one
    pub fn l4_state(&self) -> Option<u8> {
        self.tcp_state().or_else(|| self.sctp_state())
    }

    // ========================================================================
    // NAT
    // ========================================================================

    fn nat_mut(&mut self, kind: NatKind) -> &mut NatRange {
        match kind {
            NatKind::Source => &mut self.snat,
            NatKind::Destination => &mut self.dnat,
        }
    }

    fn nat(&self, kind: NatKind) -> &NatRange {
        match kind {
            NatKind::Source => &self.snat,
            NatKind::Destination => &self.dnat,
        }
    }

    /// Map to a single address
    pub fn set_nat_ipv4(&mut self, kind: NatKind, addr: Ipv4Addr) {
        let range = self.nat_mut(kind);
        range.min_ip = addr;
        range.max_ip = addr;
        self.set.set(kind.attrs().0);
    }

    /// Map to a single port
    pub fn set_nat_port(&mut self, kind: NatKind, port: u16) {
        let range = self.nat_mut(kind);
        range.min_port = port;
        range.max_port = port;
        self.set.set(kind.attrs().1);
    }

    pub fn set_nat_range(&mut self, kind: NatKind, range: NatRange) {
        *self.nat_mut(kind) = range;
        let (ip, port) = kind.attrs();
        self.set.set(ip);
        self.set.set(port);
    }

    /// Lower bound of the NAT address range
    pub fn nat_ipv4(&self, kind: NatKind) -> Option<Ipv4Addr> {
        self.gated(kind.attrs().0, self.nat(kind).min_ip)
    }

    /// Lower bound of the NAT port range
    pub fn nat_port(&self, kind: NatKind) -> Option<u16> {
        self.gated(kind.attrs().1, self.nat(kind).min_port)
    }

    /// Full range, only when both address and port are set
    pub fn nat_range(&self, kind: NatKind) -> Option<NatRange> {
        let (ip, port) = kind.attrs();
        self.set.test_all(&[ip, port]).then_some(*self.nat(kind))
    }

    // ========================================================================
    // Generic access
    // ========================================================================

    /// Read any attribute, failing with `PresenceViolation` if unset
    pub fn attr_value(&self, attr: Attr) -> Result<AttrValue> {
        self.require(attr)?;

        for dir in Direction::ALL {
            let attrs = dir.tuple_attrs();
            let t = self.tuple(dir);
            if attr == attrs.ipv4_src || attr == attrs.ipv6_src {
                return Ok(addr_value(t.src));
            }
            if attr == attrs.ipv4_dst || attr == attrs.ipv6_dst {
                return Ok(addr_value(t.dst));
            }
            if attr == attrs.port_src {
                return Ok(AttrValue::U16(t.sport));
            }
            if attr == attrs.port_dst {
                return Ok(AttrValue::U16(t.dport));
            }
            if attr == attrs.l3proto {
                return Ok(AttrValue::U8(t.l3protonum));
            }
            if attr == attrs.l4proto {
                return Ok(AttrValue::U8(t.protonum));
            }
            if let Some([pos, before, after]) = attrs.natseq {
                if attr == pos {
                    return Ok(AttrValue::U32(t.natseq.correction_pos));
                }
                if attr == before {
                    return Ok(AttrValue::U32(t.natseq.offset_before));
                }
                if attr == after {
                    return Ok(AttrValue::U32(t.natseq.offset_after));
                }
            }
        }

        let orig = Direction::Original;
        let repl = Direction::Reply;
        let missing = || ConntrackError::PresenceViolation(attr.name());
        let value = match attr {
            Attr::IcmpType => AttrValue::U8(self.tuple(orig).icmp_type),
            Attr::IcmpCode => AttrValue::U8(self.tuple(orig).icmp_code),
            Attr::IcmpId => AttrValue::U16(self.tuple(orig).icmp_id),
            Attr::TcpState => AttrValue::U8(self.tcp_state().ok_or_else(missing)?),
            Attr::TcpFlagsOrig => AttrValue::U8(self.tcp_flags(orig).ok_or_else(missing)?),
            Attr::TcpFlagsRepl => AttrValue::U8(self.tcp_flags(repl).ok_or_else(missing)?),
            Attr::TcpMaskOrig => AttrValue::U8(self.tcp_mask(orig).ok_or_else(missing)?),
            Attr::TcpMaskRepl => AttrValue::U8(self.tcp_mask(repl).ok_or_else(missing)?),
            Attr::SctpState => AttrValue::U8(self.sctp_state().ok_or_else(missing)?),
            Attr::SctpVtagOrig => AttrValue::U32(self.sctp_vtag(orig).ok_or_else(missing)?),
            Attr::SctpVtagRepl => AttrValue::U32(self.sctp_vtag(repl).ok_or_else(missing)?),
            Attr::SnatIpv4 => AttrValue::Ipv4(self.snat.min_ip),
            Attr::DnatIpv4 => AttrValue::Ipv4(self.dnat.min_ip),
            Attr::SnatPort => AttrValue::U16(self.snat.min_port),
            Attr::DnatPort => AttrValue::U16(self.dnat.min_port),
            Attr::Timeout => AttrValue::U32(self.timeout),
            Attr::Mark => AttrValue::U32(self.mark),
            Attr::Secmark => AttrValue::U32(self.secmark),
            Attr::Use => AttrValue::U32(self.use_count),
            Attr::Id => AttrValue::U32(self.id),
            Attr::Status => AttrValue::U32(self.status.bits()),
            Attr::OrigCounterPackets => AttrValue::U64(self.counters[0].packets),
            Attr::OrigCounterBytes => AttrValue::U64(self.counters[0].bytes),
            Attr::ReplCounterPackets => AttrValue::U64(self.counters[1].packets),
            Attr::ReplCounterBytes => AttrValue::U64(self.counters[1].bytes),
            // tuple attributes were resolved above
            _ => return Err(missing()),
        };
        Ok(value)
    }

    /// Compare the attributes populated in both records.
    ///
    /// Attributes set on only one side are ignored.
    pub fn compare(&self, other: &ConnectionRecord) -> bool {
        Attr::ALL
            .iter()
            .filter(|attr| self.is_set(**attr) && other.is_set(**attr))
            .all(|attr| self.attr_value(*attr).ok() == other.attr_value(*attr).ok())
    }
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for attr in Attr::ALL {
            if let Ok(value) = self.attr_value(*attr) {
                map.entry(&attr.name(), &value);
            }
        }
        map.finish()
    }
}
