//! Builder for fully populated records

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{ConntrackError, Result};
use crate::proto::{AF_INET, AF_INET6};

use super::conntrack::{ConnectionRecord, Counters, NatKind, NatRange, StatusFlags};
use super::tuple::Direction;

/// Builder for [`ConnectionRecord`]
///
/// Setters that can fail (e.g. counters on the master tuple) record the first
/// error, which is returned from [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ConnectionBuilder {
    record: ConnectionRecord,
    error: Option<ConntrackError>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn track(mut self, result: Result<()>) -> Self {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
        self
    }

    /// IPv4 addresses and layer 3 protocol of a direction
    pub fn ipv4(mut self, dir: Direction, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.record.set_l3proto(dir, AF_INET);
        self.record.set_ipv4_src(dir, src);
        self.record.set_ipv4_dst(dir, dst);
        self
    }

    /// IPv6 addresses and layer 3 protocol of a direction
    pub fn ipv6(mut self, dir: Direction, src: Ipv6Addr, dst: Ipv6Addr) -> Self {
        self.record.set_l3proto(dir, AF_INET6);
        self.record.set_ipv6_src(dir, src);
        self.record.set_ipv6_dst(dir, dst);
        self
    }

    pub fn l4proto(mut self, dir: Direction, protonum: u8) -> Self {
        self.record.set_l4proto(dir, protonum);
        self
    }

    /// Layer 4 protocol and ports of a direction
    pub fn ports(mut self, dir: Direction, protonum: u8, sport: u16, dport: u16) -> Self {
        self.record.set_l4proto(dir, protonum);
        self.record.set_port_src(dir, sport);
        self.record.set_port_dst(dir, dport);
        self
    }

    pub fn icmp(mut self, kind: u8, code: u8, id: u16) -> Self {
        self.record.set_icmp_type(kind);
        self.record.set_icmp_code(code);
        self.record.set_icmp_id(id);
        self
    }

    /// Mirror the original tuple into the reply tuple
    pub fn reply_from_original(mut self) -> Self {
        self.record.setup_reply();
        self
    }

    pub fn counters(mut self, dir: Direction, packets: u64, bytes: u64) -> Self {
        let result = self
            .record
            .set_counters(dir, Counters { packets, bytes });
        self.track(result)
    }

    pub fn timeout(mut self, timeout: u32) -> Self {
        self.record.set_timeout(timeout);
        self
    }

    pub fn mark(mut self, mark: u32) -> Self {
        self.record.set_mark(mark);
        self
    }

    pub fn secmark(mut self, secmark: u32) -> Self {
        self.record.set_secmark(secmark);
        self
    }

    pub fn use_count(mut self, use_count: u32) -> Self {
        self.record.set_use(use_count);
        self
    }

    pub fn id(mut self, id: u32) -> Self {
        self.record.set_id(id);
        self
    }

    pub fn status(mut self, status: StatusFlags) -> Self {
        self.record.set_status(status);
        self
    }

    pub fn tcp_state(mut self, state: u8) -> Self {
        self.record.set_tcp_state(state);
        self
    }

    pub fn sctp_state(mut self, state: u8) -> Self {
        self.record.set_sctp_state(state);
        self
    }

    pub fn nat_range(mut self, kind: NatKind, range: NatRange) -> Self {
        self.record.set_nat_range(kind, range);
        self
    }

    pub fn build(self) -> Result<ConnectionRecord> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.record),
        }
    }
}

impl ConnectionRecord {
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Attr;
    use crate::proto::IPPROTO_UDP;

    #[test]
    fn test_builder_sets_exact_bits() {
        let ct = ConnectionRecord::builder()
            .ipv4(Direction::Original, Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
            .ports(Direction::Original, IPPROTO_UDP, 5353, 53)
            .timeout(30)
            .build()
            .unwrap();

        assert_eq!(ct.presence().len(), 7);
        assert!(ct.is_set(Attr::OrigL3Proto));
        assert!(ct.is_set(Attr::OrigPortDst));
        assert!(!ct.is_set(Attr::ReplL3Proto));
        assert_eq!(ct.port_dst(Direction::Original), Some(53));
    }

    #[test]
    fn test_builder_reports_first_error() {
        let result = ConnectionRecord::builder()
            .counters(Direction::Master, 1, 1)
            .mark(1)
            .build();
        assert!(matches!(
            result,
            Err(ConntrackError::InvalidAttribute { direction: "master", .. })
        ));
    }
}
