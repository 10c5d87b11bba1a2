//! End-to-end: build a record, filter it, render it

use std::net::Ipv4Addr;

use conntrack::proto::{IPPROTO_TCP, IPPROTO_UDP};
use conntrack::{
    render, render_string, AddrSlot, Attr, Config, ConnectionRecord, ConntrackError, Direction,
    FilterDimension, FilterEngine, Logic, MessageKind, StatusFlags,
};

const EXPECTED: &str = concat!(
    "<flow type=\"new\">",
    "<meta direction=\"original\">",
    "<layer3 protonum=\"2\" protoname=\"ipv4\"><src>192.168.0.1</src><dst>192.168.0.2</dst></layer3>",
    "<layer4 protonum=\"6\" protoname=\"tcp\"><sport>80</sport><dport>56665</dport></layer4>",
    "<counters><packets>1</packets><bytes>10</bytes></counters>",
    "</meta>",
    "<meta direction=\"reply\">",
    "<layer3 protonum=\"2\" protoname=\"ipv4\"><src>192.168.0.2</src><dst>192.168.0.1</dst></layer3>",
    "<layer4 protonum=\"6\" protoname=\"tcp\"><sport>56665</sport><dport>80</dport></layer4>",
    "<counters><packets>12</packets><bytes>5029</bytes></counters>",
    "</meta>",
    "<meta direction=\"independent\">",
    "<timeout>100</timeout><mark>1</mark><use>1</use><assured/>",
    "</meta>",
    "</flow>",
);

fn scenario_record() -> ConnectionRecord {
    ConnectionRecord::builder()
        .ipv4(
            Direction::Original,
            Ipv4Addr::new(192, 168, 0, 1),
            Ipv4Addr::new(192, 168, 0, 2),
        )
        .ports(Direction::Original, IPPROTO_TCP, 80, 56665)
        .reply_from_original()
        .counters(Direction::Original, 1, 10)
        .counters(Direction::Reply, 12, 5029)
        .timeout(100)
        .mark(1)
        .use_count(1)
        .status(StatusFlags::ASSURED | StatusFlags::SEEN_REPLY)
        .build()
        .unwrap()
}

#[test]
fn test_scenario_renders_exactly() {
    let ct = scenario_record();
    let mut buf = [0u8; 4096];
    let len = render(&ct, MessageKind::New, &mut buf).unwrap();
    assert_eq!(std::str::from_utf8(&buf[..len]).unwrap(), EXPECTED);
    assert_eq!(render_string(&ct, MessageKind::from(1)).unwrap(), EXPECTED);
}

#[test]
fn test_render_is_deterministic() {
    let ct = scenario_record();
    let a = render_string(&ct, MessageKind::Update).unwrap();
    let b = render_string(&ct.clone(), MessageKind::Update).unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("<flow type=\"update\">"));
}

#[test]
fn test_every_short_buffer_truncates() {
    let ct = scenario_record();
    for capacity in [0, 1, 17, EXPECTED.len() / 2, EXPECTED.len() - 1] {
        let mut buf = vec![0xAAu8; capacity + 8];
        let err = render(&ct, MessageKind::New, &mut buf[..capacity]).unwrap_err();
        assert_eq!(err, ConntrackError::Truncated { capacity });
        assert!(buf[capacity..].iter().all(|&b| b == 0xAA));
    }
    let mut exact = vec![0u8; EXPECTED.len()];
    assert_eq!(render(&ct, MessageKind::New, &mut exact), Ok(EXPECTED.len()));
}

#[test]
fn test_unset_attributes_read_as_absent() {
    let mut ct = scenario_record();
    assert_eq!(ct.mark(), Some(1));
    ct.clear(Attr::Mark);
    assert_eq!(ct.mark(), None);
    assert!(ct.require(Attr::Mark).is_err());
    assert!(!render_string(&ct, MessageKind::New).unwrap().contains("<mark>"));

    let empty = ConnectionRecord::new();
    assert!(empty.presence().is_empty());
    assert!(matches!(
        render_string(&empty, MessageKind::New),
        Err(ConntrackError::PresenceViolation(_))
    ));
}

#[test]
fn test_filter_over_scenario() {
    let ct = scenario_record();
    assert!(FilterEngine::new().matches(&ct));

    let mut filter = FilterEngine::new();
    filter.add_l4proto(IPPROTO_UDP);
    assert!(!filter.matches(&ct));
    filter.set_logic(FilterDimension::L4Proto, Logic::Negative);
    assert!(filter.matches(&ct));

    filter
        .add_ipv4(
            AddrSlot::Dst,
            Ipv4Addr::new(192, 168, 0, 0),
            Ipv4Addr::new(255, 255, 0, 0),
        )
        .unwrap();
    assert!(filter.matches(&ct));
    filter.set_logic(FilterDimension::DstIpv4, Logic::Negative);
    assert!(!filter.matches(&ct));
}

#[test]
fn test_configured_pipeline() {
    let config = Config::from_str(
        r#"
[filter.l4proto]
protocols = ["tcp"]

[filter.src_ipv4]
networks = ["192.168.0.0/24"]

[output]
buffer_size = 1024
"#,
    )
    .unwrap();
    let filter = config.filter.build().unwrap();
    let ct = scenario_record();
    assert!(filter.matches(&ct));
    assert_eq!(config.output.render(&ct, MessageKind::New).unwrap(), EXPECTED);
}
