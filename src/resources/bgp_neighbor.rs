//! `junos_bgp_neighbor`: one neighbor of a BGP group
//!
//! The neighbor lives at `protocols bgp group <group> neighbor <ip>`, under
//! `routing-instances <ri>` unless the routing instance is `master`. The group
//! (and the routing instance) must already exist.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::engine::text::has_configuration;
use crate::engine::validate;
use crate::engine::value::{parse_int, quote};
use crate::engine::{join_id, Block, Prerequisite, ReadReport, Resource, Rules};
use crate::error::{Error, Result};

/// Name of the default routing instance
pub const DEFAULT_ROUTING_INSTANCE: &str = "master";

fn default_routing_instance() -> String {
    DEFAULT_ROUTING_INSTANCE.to_string()
}

/// Configuration of `junos_bgp_neighbor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BgpNeighborConfig {
    pub ip: String,
    #[serde(default = "default_routing_instance")]
    pub routing_instance: String,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_preference: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub import: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub export: Vec<String>,
    pub passive: bool,
    pub log_updown: bool,
    pub advertise_peer_as: bool,
    pub no_advertise_peer_as: bool,
    pub mtu_discovery: bool,
    pub no_mtu_discovery: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graceful_restart: Option<BgpGracefulRestart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bfd_liveness_detection: Option<BfdLivenessDetection>,
}

impl Default for BgpNeighborConfig {
    fn default() -> Self {
        Self {
            ip: String::new(),
            routing_instance: default_routing_instance(),
            group: String::new(),
            description: None,
            peer_as: None,
            local_address: None,
            local_preference: None,
            import: Vec::new(),
            export: Vec::new(),
            passive: false,
            log_updown: false,
            advertise_peer_as: false,
            no_advertise_peer_as: false,
            mtu_discovery: false,
            no_mtu_discovery: false,
            graceful_restart: None,
            bfd_liveness_detection: None,
        }
    }
}

/// Presence block: `graceful-restart` alone enables it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BgpGracefulRestart {
    pub disable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_route_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BfdLivenessDetection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_time_threshold: Option<i64>,
}

impl Block for BfdLivenessDetection {
    fn is_empty(&self) -> bool {
        self.minimum_interval.is_none()
            && self.multiplier.is_none()
            && self.detection_time_threshold.is_none()
    }
}

static GRACEFUL_RESTART_RULES: Lazy<Rules<BgpGracefulRestart>> = Lazy::new(|| {
    Rules::<BgpGracefulRestart>::new()
        .flag("disable", |gr| &mut gr.disable)
        .rule("restart-time", |gr, v| {
            gr.restart_time = Some(parse_int("restart_time", v)?);
            Ok(())
        })
        .rule("stale-routes-time", |gr, v| {
            gr.stale_route_time = Some(parse_int("stale_route_time", v)?);
            Ok(())
        })
});

static BFD_RULES: Lazy<Rules<BfdLivenessDetection>> = Lazy::new(|| {
    Rules::<BfdLivenessDetection>::new()
        .rule("detection-time threshold", |bfd, v| {
            bfd.detection_time_threshold = Some(parse_int("detection_time_threshold", v)?);
            Ok(())
        })
        .rule("minimum-interval", |bfd, v| {
            bfd.minimum_interval = Some(parse_int("minimum_interval", v)?);
            Ok(())
        })
        .rule("multiplier", |bfd, v| {
            bfd.multiplier = Some(parse_int("multiplier", v)?);
            Ok(())
        })
});

static RULES: Lazy<Rules<BgpNeighborConfig>> = Lazy::new(|| {
    Rules::<BgpNeighborConfig>::new()
        .string("description", |n| &mut n.description)
        .string("peer-as", |n| &mut n.peer_as)
        .string("local-address", |n| &mut n.local_address)
        .rule("local-preference", |n, v| {
            n.local_preference = Some(parse_int("local_preference", v)?);
            Ok(())
        })
        .list("import", |n| &mut n.import)
        .list("export", |n| &mut n.export)
        .flag("passive", |n| &mut n.passive)
        .flag("log-updown", |n| &mut n.log_updown)
        .flag("advertise-peer-as", |n| &mut n.advertise_peer_as)
        .flag("no-advertise-peer-as", |n| &mut n.no_advertise_peer_as)
        .flag("mtu-discovery", |n| &mut n.mtu_discovery)
        .flag("no-mtu-discovery", |n| &mut n.no_mtu_discovery)
        .nested(
            "graceful-restart",
            |n| &mut n.graceful_restart,
            &GRACEFUL_RESTART_RULES,
        )
        .nested(
            "bfd-liveness-detection",
            |n| &mut n.bfd_liveness_detection,
            &BFD_RULES,
        )
});

/// `junos_bgp_neighbor` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct BgpNeighbor;

impl BgpNeighbor {
    fn instance_prefix(routing_instance: &str) -> String {
        if routing_instance == DEFAULT_ROUTING_INSTANCE {
            String::new()
        } else {
            format!("routing-instances {} ", routing_instance)
        }
    }

    fn group_path(config: &BgpNeighborConfig) -> String {
        format!(
            "{}protocols bgp group {}",
            Self::instance_prefix(&config.routing_instance),
            config.group
        )
    }

    fn neighbor_path(config: &BgpNeighborConfig) -> String {
        format!("{} neighbor {}", Self::group_path(config), config.ip)
    }
}

impl Resource for BgpNeighbor {
    type Config = BgpNeighborConfig;

    const TYPE_NAME: &'static str = "junos_bgp_neighbor";
    const ID_FORMAT: &'static str = "<ip>_-_<routing_instance>_-_<group>";
    const ID_PARTS: usize = 3;

    fn id(&self, config: &Self::Config) -> String {
        join_id(&[&config.ip, &config.routing_instance, &config.group])
    }

    fn validate(&self, config: &Self::Config, diags: &mut Diagnostics) {
        validate::ip_address(diags, AttributePath::root("ip"), &config.ip);
        validate::name(diags, AttributePath::root("routing_instance"), &config.routing_instance);
        validate::name(diags, AttributePath::root("group"), &config.group);

        if let Some(ref peer_as) = config.peer_as {
            let valid = match peer_as.split_once('.') {
                Some((high, low)) => high.parse::<u16>().is_ok() && low.parse::<u16>().is_ok(),
                None => peer_as.parse::<u32>().is_ok(),
            };
            if !valid {
                diags.error_at(
                    AttributePath::root("peer_as"),
                    format!("'{}' is not a valid AS number", peer_as),
                );
            }
        }
        if let Some(ref local_address) = config.local_address {
            validate::ip_address(diags, AttributePath::root("local_address"), local_address);
        }
        validate::range(
            diags,
            AttributePath::root("local_preference"),
            config.local_preference,
            0,
            u32::MAX as i64,
        );

        let root = AttributePath::empty();
        validate::exclusive(
            diags,
            &root,
            &[
                ("advertise_peer_as", config.advertise_peer_as),
                ("no_advertise_peer_as", config.no_advertise_peer_as),
            ],
        );
        validate::exclusive(
            diags,
            &root,
            &[
                ("mtu_discovery", config.mtu_discovery),
                ("no_mtu_discovery", config.no_mtu_discovery),
            ],
        );

        if let Some(ref restart) = config.graceful_restart {
            let path = AttributePath::root("graceful_restart");
            validate::range(diags, path.attr("restart_time"), restart.restart_time, 1, 600);
            validate::range(
                diags,
                path.attr("stale_route_time"),
                restart.stale_route_time,
                1,
                600,
            );
        }
        if let Some(ref bfd) = config.bfd_liveness_detection {
            let path = AttributePath::root("bfd_liveness_detection");
            validate::not_empty(diags, path.clone(), Some(bfd));
            validate::range(diags, path.attr("minimum_interval"), bfd.minimum_interval, 1, 255000);
            validate::range(diags, path.attr("multiplier"), bfd.multiplier, 1, 255);
            validate::range(
                diags,
                path.attr("detection_time_threshold"),
                bfd.detection_time_threshold,
                0,
                u32::MAX as i64,
            );
        }
    }

    fn set_lines(&self, config: &Self::Config) -> Result<Vec<String>> {
        if config.advertise_peer_as && config.no_advertise_peer_as {
            return Err(Error::validation(
                AttributePath::root("advertise_peer_as"),
                "advertise_peer_as and no_advertise_peer_as can't be true in same time",
            ));
        }
        let prefix = format!("set {}", Self::neighbor_path(config));
        let mut lines = vec![prefix.clone()];

        if let Some(ref description) = config.description {
            lines.push(format!("{} description {}", prefix, quote(description)));
        }
        if let Some(ref peer_as) = config.peer_as {
            lines.push(format!("{} peer-as {}", prefix, peer_as));
        }
        if let Some(ref local_address) = config.local_address {
            lines.push(format!("{} local-address {}", prefix, local_address));
        }
        if let Some(preference) = config.local_preference {
            lines.push(format!("{} local-preference {}", prefix, preference));
        }
        for policy in &config.import {
            lines.push(format!("{} import {}", prefix, quote(policy)));
        }
        for policy in &config.export {
            lines.push(format!("{} export {}", prefix, quote(policy)));
        }
        let flags = [
            (config.passive, "passive"),
            (config.log_updown, "log-updown"),
            (config.advertise_peer_as, "advertise-peer-as"),
            (config.no_advertise_peer_as, "no-advertise-peer-as"),
            (config.mtu_discovery, "mtu-discovery"),
            (config.no_mtu_discovery, "no-mtu-discovery"),
        ];
        for (enabled, statement) in flags {
            if enabled {
                lines.push(format!("{} {}", prefix, statement));
            }
        }

        if let Some(ref restart) = config.graceful_restart {
            let base = format!("{} graceful-restart", prefix);
            lines.push(base.clone());
            if restart.disable {
                lines.push(format!("{} disable", base));
            }
            if let Some(time) = restart.restart_time {
                lines.push(format!("{} restart-time {}", base, time));
            }
            if let Some(time) = restart.stale_route_time {
                lines.push(format!("{} stale-routes-time {}", base, time));
            }
        }
        if let Some(ref bfd) = config.bfd_liveness_detection {
            let base = format!("{} bfd-liveness-detection", prefix);
            if let Some(interval) = bfd.minimum_interval {
                lines.push(format!("{} minimum-interval {}", base, interval));
            }
            if let Some(multiplier) = bfd.multiplier {
                lines.push(format!("{} multiplier {}", base, multiplier));
            }
            if let Some(threshold) = bfd.detection_time_threshold {
                lines.push(format!("{} detection-time threshold {}", base, threshold));
            }
        }

        Ok(lines)
    }

    fn delete_lines(&self, config: &Self::Config) -> Vec<String> {
        vec![format!("delete {}", Self::neighbor_path(config))]
    }

    fn show_path(&self, config: &Self::Config) -> String {
        Self::neighbor_path(config)
    }

    fn read(&self, key: &Self::Config, output: &str) -> Result<(Self::Config, ReadReport)> {
        let mut config = BgpNeighborConfig::default();
        if has_configuration(output) {
            config.ip = key.ip.clone();
            config.routing_instance = key.routing_instance.clone();
            config.group = key.group.clone();
        }
        let report = RULES.read(&mut config, output)?;
        Ok((config, report))
    }

    fn from_import_id(&self, parts: &[String]) -> Result<Self::Config> {
        match parts {
            [ip, routing_instance, group] => Ok(BgpNeighborConfig {
                ip: ip.clone(),
                routing_instance: routing_instance.clone(),
                group: group.clone(),
                ..Default::default()
            }),
            _ => Err(Error::InvalidImportId {
                resource: Self::TYPE_NAME.to_string(),
                id: parts.join(crate::engine::ID_SEPARATOR),
                expected: Self::ID_FORMAT.to_string(),
            }),
        }
    }

    fn prerequisites(&self, config: &Self::Config) -> Vec<Prerequisite> {
        let mut prerequisites = Vec::new();
        if config.routing_instance != DEFAULT_ROUTING_INSTANCE {
            prerequisites.push(Prerequisite::new(
                format!("routing-instances {}", config.routing_instance),
                format!("routing instance {} doesn't exist", config.routing_instance),
            ));
        }
        prerequisites.push(Prerequisite::new(
            Self::group_path(config),
            format!(
                "bgp group {} doesn't exist in routing instance {}",
                config.group, config.routing_instance
            ),
        ));
        prerequisites
    }
}
