// Counter protocol client against a fake SIOCETHTOOL kernel

mod common;

use common::{FakeNic, FakeTransport};
use ibtop::error::CounterError;
use ibtop::ethtool::EthtoolClient;
use ibtop::ethtool::wire::{ETH_SS_STATS, ETHTOOL_GSSET_INFO, ETHTOOL_GSTATS, ETHTOOL_GSTRINGS};

#[test]
fn read_counters_pairs_names_and_values_by_position() {
    let nic = FakeNic {
        names: vec![
            "rx_packets_phy".into(),
            "rx_bytes_phy".into(),
            "tx_bytes_phy".into(),
        ],
        values: vec![7, 1000, 2000],
        ..Default::default()
    };
    let client = EthtoolClient::new(FakeTransport::with_nic("ib0", nic));
    let snapshot = client.read_counters("ib0").unwrap();
    let pairs: Vec<(&str, u64)> = snapshot.iter().collect();
    assert_eq!(
        pairs,
        vec![
            ("rx_packets_phy", 7),
            ("rx_bytes_phy", 1000),
            ("tx_bytes_phy", 2000)
        ]
    );
}

#[test]
fn read_counters_issues_size_then_strings_then_stats() {
    let client = EthtoolClient::new(FakeTransport::with_nic("ib0", FakeNic::phy(1, 2)));
    client.read_counters("ib0").unwrap();
    let cmds: Vec<u32> = client.transport().calls().into_iter().map(|(_, c)| c).collect();
    assert_eq!(cmds, vec![ETHTOOL_GSSET_INFO, ETHTOOL_GSTRINGS, ETHTOOL_GSTATS]);
}

#[test]
fn unsupported_set_yields_empty_snapshot_without_fetching() {
    let nic = FakeNic {
        unsupported: true,
        ..FakeNic::phy(1, 2)
    };
    let client = EthtoolClient::new(FakeTransport::with_nic("ib0", nic));
    assert_eq!(client.string_set_len("ib0", ETH_SS_STATS).unwrap(), 0);
    let snapshot = client.read_counters("ib0").unwrap();
    assert!(snapshot.is_empty());
    let cmds: Vec<u32> = client.transport().calls().into_iter().map(|(_, c)| c).collect();
    assert_eq!(cmds, vec![ETHTOOL_GSSET_INFO, ETHTOOL_GSSET_INFO]);
}

#[test]
fn ioctl_failure_is_a_query_error() {
    let nic = FakeNic {
        fail: true,
        ..FakeNic::phy(1, 2)
    };
    let client = EthtoolClient::new(FakeTransport::with_nic("ib0", nic));
    match client.read_counters("ib0").unwrap_err() {
        CounterError::Query {
            interface, phase, ..
        } => {
            assert_eq!(interface, "ib0");
            assert_eq!(phase, "sset_info");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_interface_is_a_query_error() {
    let client = EthtoolClient::new(FakeTransport::default());
    let err = client.read_counters("ib7").unwrap_err();
    assert!(matches!(err, CounterError::Query { .. }));
    assert!(err.to_string().contains("ib7"));
}

#[test]
fn string_count_mismatch_is_malformed() {
    let nic = FakeNic {
        advertised: Some(3),
        ..FakeNic::phy(1, 2)
    };
    let client = EthtoolClient::new(FakeTransport::with_nic("ib0", nic));
    match client.read_counters("ib0").unwrap_err() {
        CounterError::Malformed {
            phase,
            expected,
            actual,
            ..
        } => {
            assert_eq!(phase, "gstrings");
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn stats_count_mismatch_is_malformed() {
    let nic = FakeNic {
        values: vec![1],
        ..FakeNic::phy(1, 2)
    };
    let client = EthtoolClient::new(FakeTransport::with_nic("ib0", nic));
    let err = client.read_counters("ib0").unwrap_err();
    assert!(matches!(err, CounterError::Malformed { phase: "gstats", .. }));
}

#[test]
fn counter_set_growing_between_phases_stays_in_buffer() {
    // GSSET_INFO says 2, then the driver exposes 2 + 40 entries
    let mut names: Vec<String> = vec!["rx_bytes_phy".into(), "tx_bytes_phy".into()];
    names.extend((0..40).map(|i| format!("rx_prio{i}_bytes")));
    let values = vec![7; names.len()];
    let nic = FakeNic {
        names,
        values,
        advertised: Some(2),
        ..Default::default()
    };
    let client = EthtoolClient::new(FakeTransport::with_nic("ib0", nic));
    match client.read_counters("ib0").unwrap_err() {
        CounterError::Malformed {
            phase,
            expected,
            actual,
            ..
        } => {
            assert_eq!(phase, "gstrings");
            assert_eq!(expected, 2);
            assert_eq!(actual, 42);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_interface_name_is_rejected_before_any_exchange() {
    let client = EthtoolClient::new(FakeTransport::default());
    let err = client.read_counters("a_very_long_ifname0").unwrap_err();
    assert!(matches!(err, CounterError::InterfaceName { .. }));
    assert!(client.transport().calls().is_empty());
}
