//! Configuration file support
//!
//! Loads a filter description and output settings from TOML:
//!
//! ```toml
//! [filter.l4proto]
//! logic = "positive"
//! protocols = ["tcp", "udp"]
//!
//! [filter.l4proto_state]
//! logic = "negative"
//! states = { tcp = ["TIME_WAIT", "CLOSE"] }
//!
//! [filter.src_ipv4]
//! logic = "negative"
//! networks = ["127.0.0.0/8", "192.168.1.10"]
//!
//! [output]
//! buffer_size = 4096
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attr::FilterDimension;
use crate::error::{ConntrackError, Result};
use crate::filter::{AddrSlot, FilterEngine, Logic};
use crate::proto::{l4_proto_from_name, state_from_name};
use crate::record::ConnectionRecord;
use crate::xml::{render_bounded, MessageKind};

/// Root configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record selection
    pub filter: FilterConfig,

    /// XML output settings
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConntrackError::Config(format!("Failed to read config file: {}", e))
        })?;
        let config = Self::from_str(&content)?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConntrackError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConntrackError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            ConntrackError::Config(format!("Failed to write config file: {}", e))
        })
    }
}

/// Declarative filter description
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub l4proto: ProtoFilterConfig,
    pub l4proto_state: StateFilterConfig,
    pub src_ipv4: AddressFilterConfig,
    pub dst_ipv4: AddressFilterConfig,
}

/// Protocols by name ("tcp") or number ("47")
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtoFilterConfig {
    pub logic: Logic,
    pub protocols: Vec<String>,
}

/// Protocol name or number mapped to state names or codes
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateFilterConfig {
    pub logic: Logic,
    pub states: BTreeMap<String, Vec<String>>,
}

/// Networks in CIDR notation; a bare address means /32
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressFilterConfig {
    pub logic: Logic,
    pub networks: Vec<String>,
}

fn parse_proto(value: &str) -> Result<u8> {
    value
        .parse::<u8>()
        .ok()
        .or_else(|| l4_proto_from_name(value))
        .ok_or_else(|| ConntrackError::Config(format!("Unknown protocol: {}", value)))
}

fn parse_state(protonum: u8, value: &str) -> Result<u8> {
    value
        .parse::<u8>()
        .ok()
        .or_else(|| state_from_name(protonum, value))
        .ok_or_else(|| {
            ConntrackError::Config(format!(
                "Unknown state {} for protocol {}",
                value, protonum
            ))
        })
}

impl AddressFilterConfig {
    fn apply(&self, filter: &mut FilterEngine, slot: AddrSlot) -> Result<()> {
        for network in &self.networks {
            let net: IpNetwork = network.parse().map_err(|e| {
                ConntrackError::Config(format!("Invalid network {}: {}", network, e))
            })?;
            filter.add_address(slot, net.ip(), net.mask())?;
        }
        filter.set_logic(slot.dimension(), self.logic);
        Ok(())
    }
}

impl FilterConfig {
    /// Build a filter engine through the construction API
    pub fn build(&self) -> Result<FilterEngine> {
        let mut filter = FilterEngine::new();

        for proto in &self.l4proto.protocols {
            filter.add_l4proto(parse_proto(proto)?);
        }
        filter.set_logic(FilterDimension::L4Proto, self.l4proto.logic);

        for (proto, states) in &self.l4proto_state.states {
            let protonum = parse_proto(proto)?;
            for state in states {
                filter.add_l4proto_state(protonum, parse_state(protonum, state)?)?;
            }
        }
        filter.set_logic(FilterDimension::L4ProtoState, self.l4proto_state.logic);

        self.src_ipv4.apply(&mut filter, AddrSlot::Src)?;
        self.dst_ipv4.apply(&mut filter, AddrSlot::Dst)?;

        debug!(
            "Built filter: {} src entries, {} dst entries, empty={}",
            filter.ipv4_entries(AddrSlot::Src).len(),
            filter.ipv4_entries(AddrSlot::Dst).len(),
            filter.is_empty()
        );
        Ok(filter)
    }
}

/// XML output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Size of the render buffer in bytes
    pub buffer_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { buffer_size: 4096 }
    }
}

impl OutputConfig {
    /// Render a record within the configured buffer size
    pub fn render(&self, ct: &ConnectionRecord, kind: MessageKind) -> Result<String> {
        render_bounded(ct, kind, self.buffer_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{IPPROTO_GRE, IPPROTO_TCP, IPPROTO_UDP};
    use crate::record::Direction;
    use std::net::Ipv4Addr;

    const SAMPLE: &str = r#"
[filter.l4proto]
logic = "positive"
protocols = ["tcp", "17"]

[filter.l4proto_state]
logic = "negative"
states = { tcp = ["TIME_WAIT", "8"] }

[filter.src_ipv4]
logic = "negative"
networks = ["127.0.0.0/8", "192.168.1.10"]

[output]
buffer_size = 512
"#;

    fn tcp(src: Ipv4Addr, state: u8) -> ConnectionRecord {
        ConnectionRecord::builder()
            .ipv4(Direction::Original, src, Ipv4Addr::new(1, 1, 1, 1))
            .ports(Direction::Original, IPPROTO_TCP, 40000, 443)
            .tcp_state(state)
            .reply_from_original()
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.buffer_size, 4096);
        assert!(config.filter.build().unwrap().is_empty());
    }

    #[test]
    fn test_parse_and_build() {
        let config = Config::from_str(SAMPLE).unwrap();
        assert_eq!(config.output.buffer_size, 512);

        let filter = config.filter.build().unwrap();
        assert!(filter.has_l4proto(IPPROTO_TCP));
        assert!(filter.has_l4proto(IPPROTO_UDP));
        assert!(!filter.has_l4proto(IPPROTO_GRE));
        assert_eq!(filter.state_map(IPPROTO_TCP), (1 << 7) | (1 << 8));
        assert_eq!(filter.logic(FilterDimension::SrcIpv4), Logic::Negative);
        assert_eq!(filter.ipv4_entries(AddrSlot::Src).len(), 2);
        assert_eq!(
            filter.ipv4_entries(AddrSlot::Src)[1].mask,
            Ipv4Addr::new(255, 255, 255, 255)
        );

        assert!(filter.matches(&tcp(Ipv4Addr::new(10, 0, 0, 1), 3)));
        assert!(!filter.matches(&tcp(Ipv4Addr::new(10, 0, 0, 1), 7)));
        assert!(!filter.matches(&tcp(Ipv4Addr::new(127, 0, 0, 1), 3)));
        assert!(!filter.matches(&tcp(Ipv4Addr::new(192, 168, 1, 10), 3)));
        assert!(filter.matches(&tcp(Ipv4Addr::new(192, 168, 1, 11), 3)));
    }

    #[test]
    fn test_unknown_names_rejected() {
        let config = Config::from_str("[filter.l4proto]\nprotocols = [\"bogus\"]\n").unwrap();
        assert!(matches!(
            config.filter.build(),
            Err(ConntrackError::Config(_))
        ));

        let config =
            Config::from_str("[filter.l4proto_state]\nstates = { udp = [\"ESTABLISHED\"] }\n")
                .unwrap();
        assert!(matches!(
            config.filter.build(),
            Err(ConntrackError::Config(_))
        ));
    }

    #[test]
    fn test_ipv6_network_rejected() {
        let config = Config::from_str("[filter.dst_ipv4]\nnetworks = [\"2001:db8::/32\"]\n").unwrap();
        assert_eq!(
            config.filter.build().unwrap_err(),
            ConntrackError::UnsupportedFamily("ipv6")
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_str("[output\nbuffer_size = 1"),
            Err(ConntrackError::Config(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conntrack.toml");
        let config = Config::from_str(SAMPLE).unwrap();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.output.buffer_size, 512);
        assert_eq!(loaded.filter.src_ipv4.networks, config.filter.src_ipv4.networks);
        assert_eq!(loaded.filter.l4proto_state.logic, Logic::Negative);
    }

    #[test]
    fn test_output_render() {
        let ct = tcp(Ipv4Addr::new(10, 0, 0, 1), 3);
        let small = OutputConfig { buffer_size: 32 };
        assert!(matches!(
            small.render(&ct, MessageKind::New),
            Err(ConntrackError::Truncated { capacity: 32 })
        ));
        let out = OutputConfig::default().render(&ct, MessageKind::New).unwrap();
        assert!(out.starts_with("<flow type=\"new\">"));
    }
}
