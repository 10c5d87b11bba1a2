//! Expectation record
//!
//! An expectation describes a connection the kernel anticipates because of
//! an existing one (an FTP data channel, for example). The kernel performs
//! the actual matching; this type only carries the data.

use crate::attr::{AttributeId, ExpAttr};
use crate::error::{ConntrackError, Result};
use crate::presence::PresenceSet;

use super::conntrack::ConnectionRecord;

#[derive(Debug, Clone, Default)]
pub struct ExpectationRecord {
    master: ConnectionRecord,
    expected: ConnectionRecord,
    mask: ConnectionRecord,
    timeout: u32,
    id: u32,
    expectfn_queue_id: u16,
    set: PresenceSet<ExpAttr>,
}

impl ExpectationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self, attr: ExpAttr) -> bool {
        self.set.test(attr)
    }

    pub fn presence(&self) -> &PresenceSet<ExpAttr> {
        &self.set
    }

    pub fn require(&self, attr: ExpAttr) -> Result<()> {
        if self.set.test(attr) {
            Ok(())
        } else {
            Err(ConntrackError::PresenceViolation(attr.name()))
        }
    }

    pub fn clear(&mut self, attr: ExpAttr) {
        self.set.clear(attr);
    }

    fn gated<T>(&self, attr: ExpAttr, value: T) -> Option<T> {
        self.set.test(attr).then_some(value)
    }

    /// Connection that spawned the expectation
    pub fn set_master(&mut self, master: ConnectionRecord) {
        self.master = master;
        self.set.set(ExpAttr::Master);
    }

    pub fn master(&self) -> Option<&ConnectionRecord> {
        self.gated(ExpAttr::Master, &self.master)
    }

    /// Shape of the anticipated connection
    pub fn set_expected(&mut self, expected: ConnectionRecord) {
        self.expected = expected;
        self.set.set(ExpAttr::Expected);
    }

    pub fn expected(&self) -> Option<&ConnectionRecord> {
        self.gated(ExpAttr::Expected, &self.expected)
    }

    /// Which fields of the expected connection are relevant
    pub fn set_mask(&mut self, mask: ConnectionRecord) {
        self.mask = mask;
        self.set.set(ExpAttr::Mask);
    }

    pub fn mask(&self) -> Option<&ConnectionRecord> {
        self.gated(ExpAttr::Mask, &self.mask)
    }

    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
        self.set.set(ExpAttr::Timeout);
    }

    pub fn timeout(&self) -> Option<u32> {
        self.gated(ExpAttr::Timeout, self.timeout)
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
        self.set.set(ExpAttr::Id);
    }

    pub fn id(&self) -> Option<u32> {
        self.gated(ExpAttr::Id, self.id)
    }

    /// Queue of the userspace expectation handler
    pub fn set_expectfn_queue_id(&mut self, queue: u16) {
        self.expectfn_queue_id = queue;
        self.set.set(ExpAttr::ExpectfnQueueId);
    }

    pub fn expectfn_queue_id(&self) -> Option<u16> {
        self.gated(ExpAttr::ExpectfnQueueId, self.expectfn_queue_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Attr;
    use crate::proto::IPPROTO_TCP;
    use crate::record::Direction;
    use std::net::Ipv4Addr;

    fn ftp_control() -> ConnectionRecord {
        ConnectionRecord::builder()
            .ipv4(Direction::Original, Ipv4Addr::new(192, 168, 0, 1), Ipv4Addr::new(192, 168, 0, 2))
            .ports(Direction::Original, IPPROTO_TCP, 40000, 21)
            .reply_from_original()
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_expectation() {
        let exp = ExpectationRecord::new();
        assert!(exp.presence().is_empty());
        assert!(exp.master().is_none());
        assert_eq!(
            exp.require(ExpAttr::Timeout),
            Err(ConntrackError::PresenceViolation("exp-timeout"))
        );
    }

    #[test]
    fn test_embedded_records() {
        let mut exp = ExpectationRecord::new();
        exp.set_master(ftp_control());

        let mut mask = ConnectionRecord::new();
        mask.set_ipv4_src(Direction::Original, Ipv4Addr::new(255, 255, 255, 255));
        exp.set_mask(mask);
        exp.set_timeout(300);
        exp.set_expectfn_queue_id(3);

        let master = exp.master().unwrap();
        assert_eq!(master.port_dst(Direction::Original), Some(21));
        assert_eq!(master.port_src(Direction::Reply), Some(21));
        assert!(exp.mask().unwrap().is_set(Attr::OrigIpv4Src));
        assert!(exp.expected().is_none());
        assert_eq!(exp.timeout(), Some(300));
        assert_eq!(exp.expectfn_queue_id(), Some(3));
        assert_eq!(exp.id(), None);
    }

    #[test]
    fn test_clear() {
        let mut exp = ExpectationRecord::new();
        exp.set_id(9);
        exp.clear(ExpAttr::Id);
        assert_eq!(exp.id(), None);
    }
}
