//! End-to-end resource lifecycles against the in-memory device.
//!
//! Every test drives a resource through the provider exactly as the CLI
//! does and checks both the returned state and the device configuration.

mod common;

use common::*;
use pretty_assertions::assert_eq;

use junos_provider::engine::{ReadReport, ReadState, Resource, State};
use junos_provider::resources::bgp_neighbor::{BfdLivenessDetection, BgpNeighborConfig};
use junos_provider::resources::routing_options::{AutonomousSystem, RoutingOptionsConfig};
use junos_provider::resources::security_zone::{AddressBookEntry, ZoneInterface};
use junos_provider::resources::static_route::StaticRouteConfig;
use junos_provider::resources::{BgpNeighbor, RoutingOptions, SecurityZone, StaticRoute};
use junos_provider::session::{MemoryDevice, SessionCall};

#[tokio::test]
async fn test_routing_options_lifecycle() {
    let device = MemoryDevice::new();
    let provider = provider(&device);

    let config = RoutingOptionsConfig {
        clean_on_destroy: true,
        autonomous_system: Some(AutonomousSystem {
            number: "65000".to_string(),
            loops: Some(5),
            ..Default::default()
        }),
        router_id: Some("192.0.2.1".to_string()),
        ..Default::default()
    };

    let state = provider
        .create(&RoutingOptions, config.clone())
        .await
        .into_result()
        .unwrap();
    assert_eq!(state.id, "routing_options");
    assert_eq!(
        device.running(),
        lines(&[
            "routing-options autonomous-system 65000",
            "routing-options autonomous-system loops 5",
            "routing-options router-id 192.0.2.1",
        ])
    );

    let read = provider
        .read(&RoutingOptions, &state.config)
        .await
        .into_result()
        .unwrap();
    assert_eq!(
        read,
        ReadState::Present(State {
            id: "routing_options".to_string(),
            config: config.clone(),
        })
    );

    let mut updated = config.clone();
    updated.autonomous_system = None;
    updated.nonstop_routing = true;
    provider
        .update(&RoutingOptions, &config, updated.clone())
        .await
        .into_result()
        .unwrap();
    assert_eq!(
        device.running(),
        lines(&[
            "routing-options nonstop-routing",
            "routing-options router-id 192.0.2.1",
        ])
    );

    provider
        .delete(&RoutingOptions, &updated)
        .await
        .into_result()
        .unwrap();
    assert!(device.running().is_empty());
    assert!(!device.is_locked());
}

#[tokio::test]
async fn test_routing_options_destroy_keeps_configuration_by_default() {
    let device = MemoryDevice::new().with_running(["set routing-options router-id 192.0.2.1"]);
    let provider = provider(&device);

    let config = RoutingOptionsConfig {
        router_id: Some("192.0.2.1".to_string()),
        ..Default::default()
    };
    provider
        .delete(&RoutingOptions, &config)
        .await
        .into_result()
        .unwrap();

    assert_eq!(device.running(), lines(&["routing-options router-id 192.0.2.1"]));
    assert!(device.journal().is_empty());
}

#[tokio::test]
async fn test_security_zone_lifecycle() {
    let device = MemoryDevice::new();
    let provider = provider(&device);

    let config = junos_provider::resources::security_zone::SecurityZoneConfig {
        name: "trust".to_string(),
        description: Some("inside network".to_string()),
        address_book: vec![AddressBookEntry {
            name: "lan".to_string(),
            network: Some("192.0.2.0/24".to_string()),
            ..Default::default()
        }],
        interface: vec![ZoneInterface {
            name: "ge-0/0/1.0".to_string(),
            inbound_services: vec!["ssh".to_string(), "ping".to_string()],
            ..Default::default()
        }],
        ..Default::default()
    };

    let state = provider
        .create(&SecurityZone, config.clone())
        .await
        .into_result()
        .unwrap();
    assert_eq!(state.id, "trust");
    assert_eq!(device.commits(), 1);
    assert!(device.journal().contains(&SessionCall::Commit(Some(
        "create resource junos_security_zone".to_string()
    ))));

    let read = provider
        .read(&SecurityZone, &state.config)
        .await
        .into_result()
        .unwrap();
    assert_eq!(read, ReadState::Present(state.clone()));

    provider
        .delete(&SecurityZone, &state.config)
        .await
        .into_result()
        .unwrap();
    assert!(device.running().is_empty());

    let gone = provider
        .read(&SecurityZone, &state.config)
        .await
        .into_result()
        .unwrap();
    assert_eq!(gone, ReadState::Gone);
}

#[tokio::test]
async fn test_security_zone_update_keeps_unmanaged_statements() {
    let device = MemoryDevice::new().with_running([
        "set security zones security-zone dmz",
        "set security zones security-zone dmz tcp-rst",
        "set security zones security-zone dmz advance-policy-based-routing-profile apbr",
    ]);
    let provider = provider(&device);

    let mut updated = dmz();
    updated.tcp_rst = false;
    updated.screen = Some("untrust-screen".to_string());
    provider
        .update(&SecurityZone, &dmz(), updated)
        .await
        .into_result()
        .unwrap();

    assert_eq!(
        device.running(),
        lines(&[
            "security zones security-zone dmz",
            "security zones security-zone dmz advance-policy-based-routing-profile apbr",
            "security zones security-zone dmz screen untrust-screen",
        ])
    );
}

#[tokio::test]
async fn test_bgp_neighbor_lifecycle() {
    let device = MemoryDevice::new().with_running([
        "set routing-instances blue instance-type virtual-router",
        "set routing-instances blue protocols bgp group peers type external",
    ]);
    let provider = provider(&device);

    let config = BgpNeighborConfig {
        ip: "192.0.2.2".to_string(),
        routing_instance: "blue".to_string(),
        group: "peers".to_string(),
        peer_as: Some("65001".to_string()),
        description: Some("transit A".to_string()),
        bfd_liveness_detection: Some(BfdLivenessDetection {
            minimum_interval: Some(300),
            multiplier: Some(3),
            ..Default::default()
        }),
        ..Default::default()
    };

    let state = provider
        .create(&BgpNeighbor, config.clone())
        .await
        .into_result()
        .unwrap();
    assert_eq!(state.id, "192.0.2.2_-_blue_-_peers");

    let imported = provider
        .import(&BgpNeighbor, "192.0.2.2_-_blue_-_peers")
        .await
        .into_result()
        .unwrap();
    assert_eq!(imported, state);

    provider
        .delete(&BgpNeighbor, &state.config)
        .await
        .into_result()
        .unwrap();
    assert_eq!(
        device.running(),
        lines(&[
            "routing-instances blue instance-type virtual-router",
            "routing-instances blue protocols bgp group peers type external",
        ])
    );
}

#[tokio::test]
async fn test_static_route_ipv6_in_routing_instance() {
    let device = MemoryDevice::new().with_running(["set routing-instances blue"]);
    let provider = provider(&device);

    let config = StaticRouteConfig {
        destination: "2001:db8::/32".to_string(),
        routing_instance: "blue".to_string(),
        next_hop: vec!["2001:db8:ffff::1".to_string()],
        preference: Some(10),
        ..Default::default()
    };

    let state = provider
        .create(&StaticRoute, config)
        .await
        .into_result()
        .unwrap();
    assert_eq!(state.id, "2001:db8::/32_-_blue");
    assert!(device.running().contains(
        &"routing-instances blue routing-options rib blue.inet6.0 static route 2001:db8::/32 next-hop 2001:db8:ffff::1"
            .to_string()
    ));

    let imported = provider
        .import(&StaticRoute, "2001:db8::/32_-_blue")
        .await
        .into_result()
        .unwrap();
    assert_eq!(imported, state);
}

#[tokio::test]
async fn test_import_missing_resource() {
    let device = MemoryDevice::new();
    let provider = provider(&device);

    let err = provider
        .import(&SecurityZone, "untrust")
        .await
        .into_result()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Don't find junos_security_zone with id 'untrust' (id must be <name>)"
    );
}

#[tokio::test]
async fn test_import_malformed_identifier() {
    let device = MemoryDevice::new();
    let provider = provider(&device);

    let err = provider
        .import(&BgpNeighbor, "192.0.2.2_-_master")
        .await
        .into_result()
        .unwrap_err();
    assert!(err.to_string().contains("<ip>_-_<routing_instance>_-_<group>"));
    assert!(device.journal().is_empty());
}

#[tokio::test]
async fn test_read_ignores_unmanaged_statements() {
    let device = MemoryDevice::new().with_running([
        "set security zones security-zone dmz",
        "set security zones security-zone dmz tcp-rst",
        "set security zones security-zone dmz enable-reverse-reroute-extra knob",
    ]);
    let provider = provider(&device);

    let key = junos_provider::resources::security_zone::SecurityZoneConfig {
        name: "dmz".to_string(),
        ..Default::default()
    };
    let read = provider
        .read(&SecurityZone, &key)
        .await
        .into_result()
        .unwrap();
    assert_eq!(
        read,
        ReadState::Present(State {
            id: "dmz".to_string(),
            config: dmz(),
        })
    );
}

#[tokio::test]
async fn test_read_ignores_unmanaged_keywords_inside_statements() {
    let device = MemoryDevice::new().with_running([
        "set routing-options autonomous-system 65000",
        "set routing-options autonomous-system independent-domain no-attrset",
        "set security zones security-zone dmz",
        "set security zones security-zone dmz address-book address web range-address 10.0.0.1 to 10.0.0.5",
        "set security zones security-zone dmz address-book address lan 192.0.2.0/24",
        "set security zones security-zone dmz tcp-rst",
    ]);
    let provider = provider(&device);

    let read = provider
        .read(&RoutingOptions, &RoutingOptionsConfig::default())
        .await
        .into_result()
        .unwrap();
    assert_eq!(
        read,
        ReadState::Present(State {
            id: "routing_options".to_string(),
            config: RoutingOptionsConfig {
                autonomous_system: Some(AutonomousSystem {
                    number: "65000".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        })
    );

    let read = provider
        .read(&SecurityZone, &dmz())
        .await
        .into_result()
        .unwrap();
    let mut expected = dmz();
    expected.address_book = vec![AddressBookEntry {
        name: "lan".to_string(),
        network: Some("192.0.2.0/24".to_string()),
        ..Default::default()
    }];
    assert_eq!(
        read,
        ReadState::Present(State {
            id: "dmz".to_string(),
            config: expected,
        })
    );

    let (_, report) = RoutingOptions
        .read(
            &RoutingOptionsConfig::default(),
            "set autonomous-system 65000\nset autonomous-system independent-domain no-attrset",
        )
        .unwrap();
    assert_eq!(report, ReadReport { matched: 1, unmatched: 1 });
}
