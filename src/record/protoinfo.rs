//! Per-protocol connection state
//!
//! TCP and SCTP state share one storage slot on the record; only one of them
//! can be populated at a time.

/// TCP window flags of one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TcpFlagPair {
    pub value: u8,
    pub mask: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TcpInfo {
    pub(crate) state: u8,
    /// Indexed by direction
    pub(crate) flags: [TcpFlagPair; 3],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SctpInfo {
    pub(crate) state: u8,
    /// Verification tag, indexed by direction
    pub(crate) vtag: [u32; 3],
}

/// Protocol state carried by a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProtocolState {
    #[default]
    None,
    Tcp(TcpInfo),
    Sctp(SctpInfo),
}

impl ProtocolState {
    pub(crate) fn tcp(&self) -> Option<&TcpInfo> {
        match self {
            ProtocolState::Tcp(info) => Some(info),
            _ => None,
        }
    }

    pub(crate) fn sctp(&self) -> Option<&SctpInfo> {
        match self {
            ProtocolState::Sctp(info) => Some(info),
            _ => None,
        }
    }
}
