//! Protocol numbers, state codes and their names
//!
//! The number-to-name tables are process-wide constants and are safe to read
//! from any thread.

// Layer 4 protocol numbers
pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;
pub const IPPROTO_DCCP: u8 = 33;
pub const IPPROTO_GRE: u8 = 47;
pub const IPPROTO_ICMPV6: u8 = 58;
pub const IPPROTO_SCTP: u8 = 132;

/// Size of the layer 4 protocol number space
pub const IPPROTO_MAX: usize = 256;

// Layer 3 protocol numbers (address families)
pub const AF_INET: u8 = 2;
pub const AF_INET6: u8 = 10;

/// Name rendered for numbers missing from the tables
pub const UNKNOWN_PROTO_NAME: &str = "unknown";

static L4_PROTO_NAMES: [Option<&str>; IPPROTO_MAX] = {
    let mut names = [None; IPPROTO_MAX];
    names[IPPROTO_TCP as usize] = Some("tcp");
    names[IPPROTO_UDP as usize] = Some("udp");
    names[IPPROTO_ICMP as usize] = Some("icmp");
    names[IPPROTO_SCTP as usize] = Some("sctp");
    names
};

static L3_PROTO_NAMES: [Option<&str>; IPPROTO_MAX] = {
    let mut names = [None; IPPROTO_MAX];
    names[AF_INET as usize] = Some("ipv4");
    names[AF_INET6 as usize] = Some("ipv6");
    names
};

/// Name of a layer 4 protocol number, if known
pub fn l4_proto_name(protonum: u8) -> Option<&'static str> {
    L4_PROTO_NAMES[protonum as usize]
}

/// Name of a layer 3 protocol number, if known
pub fn l3_proto_name(protonum: u8) -> Option<&'static str> {
    L3_PROTO_NAMES[protonum as usize]
}

/// Reverse lookup of [`l4_proto_name`]
pub fn l4_proto_from_name(name: &str) -> Option<u8> {
    L4_PROTO_NAMES
        .iter()
        .position(|n| n.map(|n| n.eq_ignore_ascii_case(name)).unwrap_or(false))
        .map(|i| i as u8)
}

/// Does this layer 4 protocol carry source/destination ports?
pub fn has_ports(protonum: u8) -> bool {
    matches!(protonum, IPPROTO_TCP | IPPROTO_UDP | IPPROTO_SCTP)
}

/// TCP conntrack state codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TcpState {
    None = 0,
    SynSent = 1,
    SynRecv = 2,
    Established = 3,
    FinWait = 4,
    CloseWait = 5,
    LastAck = 6,
    TimeWait = 7,
    Close = 8,
    SynSent2 = 9,
}

impl TcpState {
    pub const ALL: [TcpState; 10] = [
        TcpState::None,
        TcpState::SynSent,
        TcpState::SynRecv,
        TcpState::Established,
        TcpState::FinWait,
        TcpState::CloseWait,
        TcpState::LastAck,
        TcpState::TimeWait,
        TcpState::Close,
        TcpState::SynSent2,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TcpState::None => "NONE",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynRecv => "SYN_RECV",
            TcpState::Established => "ESTABLISHED",
            TcpState::FinWait => "FIN_WAIT",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::LastAck => "LAST_ACK",
            TcpState::TimeWait => "TIME_WAIT",
            TcpState::Close => "CLOSE",
            TcpState::SynSent2 => "SYN_SENT2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

/// SCTP conntrack state codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SctpState {
    None = 0,
    Closed = 1,
    CookieWait = 2,
    CookieEchoed = 3,
    Established = 4,
    ShutdownSent = 5,
    ShutdownRecd = 6,
    ShutdownAckSent = 7,
}

impl SctpState {
    pub const ALL: [SctpState; 8] = [
        SctpState::None,
        SctpState::Closed,
        SctpState::CookieWait,
        SctpState::CookieEchoed,
        SctpState::Established,
        SctpState::ShutdownSent,
        SctpState::ShutdownRecd,
        SctpState::ShutdownAckSent,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            SctpState::None => "NONE",
            SctpState::Closed => "CLOSED",
            SctpState::CookieWait => "COOKIE_WAIT",
            SctpState::CookieEchoed => "COOKIE_ECHOED",
            SctpState::Established => "ESTABLISHED",
            SctpState::ShutdownSent => "SHUTDOWN_SENT",
            SctpState::ShutdownRecd => "SHUTDOWN_RECD",
            SctpState::ShutdownAckSent => "SHUTDOWN_ACK_SENT",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

/// Resolve a state name for the given layer 4 protocol
pub fn state_from_name(protonum: u8, name: &str) -> Option<u8> {
    match protonum {
        IPPROTO_TCP => TcpState::from_name(name).map(TcpState::code),
        IPPROTO_SCTP => SctpState::from_name(name).map(SctpState::code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(l4_proto_name(IPPROTO_TCP), Some("tcp"));
        assert_eq!(l4_proto_name(IPPROTO_SCTP), Some("sctp"));
        assert_eq!(l3_proto_name(AF_INET), Some("ipv4"));
        assert_eq!(l3_proto_name(AF_INET6), Some("ipv6"));
    }

    #[test]
    fn test_unmapped_numbers() {
        assert_eq!(l4_proto_name(IPPROTO_GRE), None);
        assert_eq!(l4_proto_name(255), None);
        assert_eq!(l3_proto_name(IPPROTO_GRE), None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(l4_proto_from_name("UDP"), Some(IPPROTO_UDP));
        assert_eq!(l4_proto_from_name("gre"), None);
    }

    #[test]
    fn test_ports() {
        assert!(has_ports(IPPROTO_TCP));
        assert!(has_ports(IPPROTO_SCTP));
        assert!(!has_ports(IPPROTO_ICMP));
        assert!(!has_ports(IPPROTO_GRE));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(TcpState::from_code(3), Some(TcpState::Established));
        assert_eq!(TcpState::from_code(10), None);
        assert_eq!(state_from_name(IPPROTO_TCP, "time_wait"), Some(7));
        assert_eq!(state_from_name(IPPROTO_SCTP, "COOKIE_ECHOED"), Some(3));
        assert_eq!(state_from_name(IPPROTO_UDP, "ESTABLISHED"), None);
    }
}
