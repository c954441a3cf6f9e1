//! Property-based tests for junos-provider using proptest.
//!
//! Covers identifier handling, value quoting and the structural validators
//! with random input.

use proptest::prelude::*;

use junos_provider::diagnostics::Diagnostics;
use junos_provider::engine::value::{quote, split_token, unquote};
use junos_provider::engine::{join_id, split_id, Resource, ID_SEPARATOR};
use junos_provider::resources::bgp_neighbor::{BfdLivenessDetection, BgpNeighborConfig};
use junos_provider::resources::static_route::StaticRouteConfig;
use junos_provider::resources::{BgpNeighbor, StaticRoute};

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// Identifier parts: non-empty, free of the separator
fn id_part() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9./:-]{1,24}")
        .unwrap()
        .prop_filter("no separator", |s| !s.contains(ID_SEPARATOR))
}

/// Configuration values, possibly with characters that need quoting
fn config_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_.-]{1,32}",
        "[a-zA-Z0-9 ;{}#]{1,32}",
        Just(String::new()),
    ]
}

// ============================================================================
// Identifiers
// ============================================================================

proptest! {
    #[test]
    fn split_id_inverts_join_id(parts in prop::collection::vec(id_part(), 1..4)) {
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let id = join_id(&refs);
        let split = split_id("junos_test", &id, parts.len(), "<a>").unwrap();
        prop_assert_eq!(split, parts);
    }

    #[test]
    fn split_id_rejects_missing_parts(parts in prop::collection::vec(id_part(), 1..3)) {
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let id = join_id(&refs);
        prop_assert!(split_id("junos_test", &id, parts.len() + 1, "<a>").is_err());
    }

    #[test]
    fn split_id_rejects_empty_parts(first in id_part(), second in id_part()) {
        let id = format!("{}{}{}", first, ID_SEPARATOR, ID_SEPARATOR);
        prop_assert!(split_id("junos_test", &id, 3, "<a>").is_err());
        let id = format!("{}{}{}", ID_SEPARATOR, first, second);
        prop_assert!(split_id("junos_test", &id, 2, "<a>").is_err());
    }
}

// ============================================================================
// Values
// ============================================================================

proptest! {
    #[test]
    fn quoted_values_read_back(value in config_value()) {
        let quoted = quote(&value);
        prop_assert_eq!(unquote(&quoted), value.clone());

        let line = format!("{} tail", quoted);
        let (token, rest) = split_token(&line);
        prop_assert_eq!(token, value);
        prop_assert_eq!(rest, "tail");
    }
}

// ============================================================================
// Validators
// ============================================================================

proptest! {
    #[test]
    fn exclusive_route_targets(
        next_hop in any::<bool>(),
        discard in any::<bool>(),
        receive in any::<bool>(),
        reject in any::<bool>(),
    ) {
        let config = StaticRouteConfig {
            destination: "192.0.2.0/24".to_string(),
            next_hop: if next_hop { vec!["192.0.2.1".to_string()] } else { Vec::new() },
            discard,
            receive,
            reject,
            ..Default::default()
        };
        let mut diags = Diagnostics::new();
        StaticRoute.validate(&config, &mut diags);

        // None at all leaves the route without any statement
        let set = [next_hop, discard, receive, reject].iter().filter(|b| **b).count();
        prop_assert_eq!(diags.has_errors(), set != 1);
    }

    #[test]
    fn empty_blocks_are_rejected(
        minimum_interval in prop::option::of(1i64..255_000),
        multiplier in prop::option::of(1i64..255),
    ) {
        let config = BgpNeighborConfig {
            ip: "192.0.2.2".to_string(),
            group: "peers".to_string(),
            bfd_liveness_detection: Some(BfdLivenessDetection {
                minimum_interval,
                multiplier,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut diags = Diagnostics::new();
        BgpNeighbor.validate(&config, &mut diags);

        let empty = minimum_interval.is_none() && multiplier.is_none();
        prop_assert_eq!(diags.has_errors(), empty);
        if empty {
            let error = diags.errors().next().unwrap();
            prop_assert_eq!(
                error.path.as_ref().unwrap().to_string(),
                "bfd_liveness_detection"
            );
        }
    }
}
