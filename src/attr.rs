//! Attribute identifiers
//!
//! Every optional field of a record is addressed by a zero-based attribute id.
//! The ids double as bit positions in the record's [`PresenceSet`].
//!
//! [`PresenceSet`]: crate::presence::PresenceSet

/// A finite, zero-based attribute index space
pub trait AttributeId: Copy + Eq + std::fmt::Debug {
    /// Number of ids in the space
    const COUNT: usize;

    /// Bit position of this id
    fn index(self) -> usize;

    /// Stable name used in logs and errors
    fn name(self) -> &'static str;
}

macro_rules! attribute_ids {
    (
        $(#[$meta:meta])*
        pub enum $ty:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $ty {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $ty {
            /// All ids in index order
            pub const ALL: &'static [$ty] = &[ $( $ty::$variant, )+ ];
        }

        impl AttributeId for $ty {
            const COUNT: usize = $ty::ALL.len();

            fn index(self) -> usize {
                self as usize
            }

            fn name(self) -> &'static str {
                match self {
                    $( $ty::$variant => $label, )+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

attribute_ids! {
    /// Conntrack attributes
    pub enum Attr {
        OrigIpv4Src => "orig-ipv4-src",
        OrigIpv4Dst => "orig-ipv4-dst",
        ReplIpv4Src => "repl-ipv4-src",
        ReplIpv4Dst => "repl-ipv4-dst",
        OrigIpv6Src => "orig-ipv6-src",
        OrigIpv6Dst => "orig-ipv6-dst",
        ReplIpv6Src => "repl-ipv6-src",
        ReplIpv6Dst => "repl-ipv6-dst",
        OrigPortSrc => "orig-port-src",
        OrigPortDst => "orig-port-dst",
        ReplPortSrc => "repl-port-src",
        ReplPortDst => "repl-port-dst",
        IcmpType => "icmp-type",
        IcmpCode => "icmp-code",
        IcmpId => "icmp-id",
        OrigL3Proto => "orig-l3proto",
        ReplL3Proto => "repl-l3proto",
        OrigL4Proto => "orig-l4proto",
        ReplL4Proto => "repl-l4proto",
        TcpState => "tcp-state",
        SnatIpv4 => "snat-ipv4",
        DnatIpv4 => "dnat-ipv4",
        SnatPort => "snat-port",
        DnatPort => "dnat-port",
        Timeout => "timeout",
        Mark => "mark",
        OrigCounterPackets => "orig-counter-packets",
        ReplCounterPackets => "repl-counter-packets",
        OrigCounterBytes => "orig-counter-bytes",
        ReplCounterBytes => "repl-counter-bytes",
        Use => "use",
        Id => "id",
        Status => "status",
        TcpFlagsOrig => "tcp-flags-orig",
        TcpFlagsRepl => "tcp-flags-repl",
        TcpMaskOrig => "tcp-mask-orig",
        TcpMaskRepl => "tcp-mask-repl",
        MasterIpv4Src => "master-ipv4-src",
        MasterIpv4Dst => "master-ipv4-dst",
        MasterIpv6Src => "master-ipv6-src",
        MasterIpv6Dst => "master-ipv6-dst",
        MasterPortSrc => "master-port-src",
        MasterPortDst => "master-port-dst",
        MasterL3Proto => "master-l3proto",
        MasterL4Proto => "master-l4proto",
        Secmark => "secmark",
        OrigNatSeqCorrectionPos => "orig-nat-seq-correction-pos",
        OrigNatSeqOffsetBefore => "orig-nat-seq-offset-before",
        OrigNatSeqOffsetAfter => "orig-nat-seq-offset-after",
        ReplNatSeqCorrectionPos => "repl-nat-seq-correction-pos",
        ReplNatSeqOffsetBefore => "repl-nat-seq-offset-before",
        ReplNatSeqOffsetAfter => "repl-nat-seq-offset-after",
        SctpState => "sctp-state",
        SctpVtagOrig => "sctp-vtag-orig",
        SctpVtagRepl => "sctp-vtag-repl",
    }
}

attribute_ids! {
    /// Expectation attributes
    pub enum ExpAttr {
        Master => "exp-master",
        Expected => "exp-expected",
        Mask => "exp-mask",
        Timeout => "exp-timeout",
        Id => "exp-id",
        ExpectfnQueueId => "exp-expectfn-queue-id",
    }
}

attribute_ids! {
    /// Filterable dimensions of a [`FilterEngine`](crate::filter::FilterEngine)
    pub enum FilterDimension {
        L4Proto => "l4proto",
        L4ProtoState => "l4proto-state",
        SrcIpv4 => "src-ipv4",
        DstIpv4 => "dst-ipv4",
    }
}

impl Attr {
    /// Attributes that live in the shared TCP/SCTP protocol-state storage
    pub(crate) const TCP_STATE_ATTRS: &'static [Attr] = &[
        Attr::TcpState,
        Attr::TcpFlagsOrig,
        Attr::TcpFlagsRepl,
        Attr::TcpMaskOrig,
        Attr::TcpMaskRepl,
    ];

    pub(crate) const SCTP_STATE_ATTRS: &'static [Attr] =
        &[Attr::SctpState, Attr::SctpVtagOrig, Attr::SctpVtagRepl];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense() {
        for (i, attr) in Attr::ALL.iter().enumerate() {
            assert_eq!(attr.index(), i);
        }
        assert_eq!(Attr::COUNT, 55);
        assert_eq!(ExpAttr::COUNT, 6);
        assert_eq!(FilterDimension::COUNT, 4);
    }

    #[test]
    fn test_names() {
        assert_eq!(Attr::OrigCounterPackets.name(), "orig-counter-packets");
        assert_eq!(FilterDimension::SrcIpv4.to_string(), "src-ipv4");
    }
}
