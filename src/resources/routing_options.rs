//! `junos_routing_options`: global `routing-options` stanza
//!
//! A singleton: its identifier is always `routing_options`. The stanza is
//! shared with other resources (static routes live under it), so updates
//! delete only the statements managed here, and destroy leaves the device
//! untouched unless `clean_on_destroy` is set.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::engine::validate;
use crate::engine::value::{parse_int, quote, split_token};
use crate::engine::{Block, ReadReport, Resource, Rules};
use crate::error::{Error, Result};

const SET_PREFIX: &str = "set routing-options ";
const DELETE_PREFIX: &str = "delete routing-options ";
const SINGLETON_ID: &str = "routing_options";

/// Configuration of `junos_routing_options`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingOptionsConfig {
    /// Delete the managed statements when the resource is destroyed
    pub clean_on_destroy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autonomous_system: Option<AutonomousSystem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarding_table: Option<ForwardingTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graceful_restart: Option<GracefulRestart>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instance_export: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instance_import: Vec<String>,
    pub nonstop_routing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutonomousSystem {
    pub number: String,
    pub asdot_notation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loops: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForwardingTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_composite_max_label_count: Option<i64>,
    pub ecmp_fast_reroute: bool,
    pub no_ecmp_fast_reroute: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub export: Vec<String>,
    pub indirect_next_hop: bool,
    pub no_indirect_next_hop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unicast_reverse_path: Option<String>,
}

impl Block for ForwardingTable {
    fn is_empty(&self) -> bool {
        self.chain_composite_max_label_count.is_none()
            && !self.ecmp_fast_reroute
            && !self.no_ecmp_fast_reroute
            && self.export.is_empty()
            && !self.indirect_next_hop
            && !self.no_indirect_next_hop
            && self.unicast_reverse_path.is_none()
    }
}

/// Presence block: `graceful-restart` alone enables it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GracefulRestart {
    pub disable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_duration: Option<i64>,
}

static GRACEFUL_RESTART_RULES: Lazy<Rules<GracefulRestart>> = Lazy::new(|| {
    Rules::<GracefulRestart>::new()
        .flag("disable", |gr| &mut gr.disable)
        .rule("restart-duration", |gr, v| {
            gr.restart_duration = Some(parse_int("restart_duration", v)?);
            Ok(())
        })
});

static FORWARDING_TABLE_RULES: Lazy<Rules<ForwardingTable>> = Lazy::new(|| {
    Rules::<ForwardingTable>::new()
        .rule("chain-composite-max-label-count", |ft, v| {
            ft.chain_composite_max_label_count =
                Some(parse_int("chain_composite_max_label_count", v)?);
            Ok(())
        })
        .flag("ecmp-fast-reroute", |ft| &mut ft.ecmp_fast_reroute)
        .flag("no-ecmp-fast-reroute", |ft| &mut ft.no_ecmp_fast_reroute)
        .list("export", |ft| &mut ft.export)
        .flag("indirect-next-hop", |ft| &mut ft.indirect_next_hop)
        .flag("no-indirect-next-hop", |ft| &mut ft.no_indirect_next_hop)
        .string("unicast-reverse-path", |ft| &mut ft.unicast_reverse_path)
});

static RULES: Lazy<Rules<RoutingOptionsConfig>> = Lazy::new(|| {
    Rules::<RoutingOptionsConfig>::new()
        .try_rule("autonomous-system", read_autonomous_system)
        .nested(
            "forwarding-table",
            |c| &mut c.forwarding_table,
            &FORWARDING_TABLE_RULES,
        )
        .nested(
            "graceful-restart",
            |c| &mut c.graceful_restart,
            &GRACEFUL_RESTART_RULES,
        )
        .list("instance-export", |c| &mut c.instance_export)
        .list("instance-import", |c| &mut c.instance_import)
        .flag("nonstop-routing", |c| &mut c.nonstop_routing)
        .string("router-id", |c| &mut c.router_id)
});

/// Plain (`65000`) or asdot (`1.10`) AS number
static AS_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("Invalid AS number regex"));

/// `autonomous-system [<number>] [loops <n>] [asdot-notation]`, in any split.
///
/// Only the first token may be the number; any other keyword leaves the
/// configuration untouched and the statement unmatched.
fn read_autonomous_system(config: &mut RoutingOptionsConfig, rest: &str) -> Result<bool> {
    let mut number = None;
    let mut loops = None;
    let mut asdot_notation = false;

    let mut rest = rest;
    let (first, after_first) = split_token(rest);
    if AS_NUMBER.is_match(&first) {
        number = Some(first);
        rest = after_first;
    }
    while !rest.is_empty() {
        let (token, tail) = split_token(rest);
        match token.as_str() {
            "loops" => {
                let (value, tail) = split_token(tail);
                loops = Some(parse_int("loops", &value)?);
                rest = tail;
            }
            "asdot-notation" => {
                asdot_notation = true;
                rest = tail;
            }
            _ => return Ok(false),
        }
    }
    if number.is_none() && loops.is_none() && !asdot_notation {
        return Ok(false);
    }

    let system = config
        .autonomous_system
        .get_or_insert_with(AutonomousSystem::default);
    if let Some(number) = number {
        system.number = number;
    }
    if loops.is_some() {
        system.loops = loops;
    }
    system.asdot_notation |= asdot_notation;
    Ok(true)
}

/// `junos_routing_options` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingOptions;

impl Resource for RoutingOptions {
    type Config = RoutingOptionsConfig;

    const TYPE_NAME: &'static str = "junos_routing_options";
    const ID_FORMAT: &'static str = "routing_options";

    fn id(&self, _config: &Self::Config) -> String {
        SINGLETON_ID.to_string()
    }

    fn validate(&self, config: &Self::Config, diags: &mut Diagnostics) {
        if let Some(ref system) = config.autonomous_system {
            let path = AttributePath::root("autonomous_system");
            if system.number.is_empty() {
                diags.error_at(path.attr("number"), "must not be empty");
            }
            validate::range(diags, path.attr("loops"), system.loops, 1, 10);
        }

        if let Some(ref table) = config.forwarding_table {
            let path = AttributePath::root("forwarding_table");
            validate::not_empty(diags, path.clone(), Some(table));
            validate::range(
                diags,
                path.attr("chain_composite_max_label_count"),
                table.chain_composite_max_label_count,
                1,
                8,
            );
            validate::exclusive(
                diags,
                &path,
                &[
                    ("ecmp_fast_reroute", table.ecmp_fast_reroute),
                    ("no_ecmp_fast_reroute", table.no_ecmp_fast_reroute),
                ],
            );
            validate::exclusive(
                diags,
                &path,
                &[
                    ("indirect_next_hop", table.indirect_next_hop),
                    ("no_indirect_next_hop", table.no_indirect_next_hop),
                ],
            );
            validate::one_of(
                diags,
                path.attr("unicast_reverse_path"),
                table.unicast_reverse_path.as_deref(),
                &["active-paths", "feasible-paths"],
            );
        }

        if let Some(ref restart) = config.graceful_restart {
            validate::range(
                diags,
                AttributePath::root("graceful_restart").attr("restart_duration"),
                restart.restart_duration,
                120,
                10000,
            );
        }

        if let Some(ref router_id) = config.router_id {
            if router_id.parse::<std::net::Ipv4Addr>().is_err() {
                diags.error_at(
                    AttributePath::root("router_id"),
                    format!("'{}' is not a valid IPv4 address", router_id),
                );
            }
        }
    }

    fn set_lines(&self, config: &Self::Config) -> Result<Vec<String>> {
        let mut lines = Vec::new();

        if let Some(ref system) = config.autonomous_system {
            let prefix = format!("{}autonomous-system ", SET_PREFIX);
            lines.push(format!("{}{}", prefix, system.number));
            if let Some(loops) = system.loops {
                lines.push(format!("{}loops {}", prefix, loops));
            }
            if system.asdot_notation {
                lines.push(format!("{}asdot-notation", prefix));
            }
        }

        if let Some(ref table) = config.forwarding_table {
            let path = AttributePath::root("forwarding_table");
            if table.ecmp_fast_reroute && table.no_ecmp_fast_reroute {
                return Err(Error::validation(
                    path.attr("ecmp_fast_reroute"),
                    "ecmp_fast_reroute and no_ecmp_fast_reroute can't be true in same time",
                ));
            }
            if table.indirect_next_hop && table.no_indirect_next_hop {
                return Err(Error::validation(
                    path.attr("indirect_next_hop"),
                    "indirect_next_hop and no_indirect_next_hop can't be true in same time",
                ));
            }
            let prefix = format!("{}forwarding-table ", SET_PREFIX);
            if let Some(count) = table.chain_composite_max_label_count {
                lines.push(format!("{}chain-composite-max-label-count {}", prefix, count));
            }
            if table.ecmp_fast_reroute {
                lines.push(format!("{}ecmp-fast-reroute", prefix));
            }
            if table.no_ecmp_fast_reroute {
                lines.push(format!("{}no-ecmp-fast-reroute", prefix));
            }
            for policy in &table.export {
                lines.push(format!("{}export {}", prefix, quote(policy)));
            }
            if table.indirect_next_hop {
                lines.push(format!("{}indirect-next-hop", prefix));
            }
            if table.no_indirect_next_hop {
                lines.push(format!("{}no-indirect-next-hop", prefix));
            }
            if let Some(ref mode) = table.unicast_reverse_path {
                lines.push(format!("{}unicast-reverse-path {}", prefix, mode));
            }
        }

        if let Some(ref restart) = config.graceful_restart {
            let prefix = format!("{}graceful-restart", SET_PREFIX);
            lines.push(prefix.clone());
            if restart.disable {
                lines.push(format!("{} disable", prefix));
            }
            if let Some(duration) = restart.restart_duration {
                lines.push(format!("{} restart-duration {}", prefix, duration));
            }
        }

        for policy in &config.instance_export {
            lines.push(format!("{}instance-export {}", SET_PREFIX, quote(policy)));
        }
        for policy in &config.instance_import {
            lines.push(format!("{}instance-import {}", SET_PREFIX, quote(policy)));
        }
        if config.nonstop_routing {
            lines.push(format!("{}nonstop-routing", SET_PREFIX));
        }
        if let Some(ref router_id) = config.router_id {
            lines.push(format!("{}router-id {}", SET_PREFIX, router_id));
        }

        Ok(lines)
    }

    fn delete_lines(&self, _config: &Self::Config) -> Vec<String> {
        [
            "autonomous-system",
            "forwarding-table chain-composite-max-label-count",
            "forwarding-table ecmp-fast-reroute",
            "forwarding-table no-ecmp-fast-reroute",
            "forwarding-table export",
            "forwarding-table indirect-next-hop",
            "forwarding-table no-indirect-next-hop",
            "forwarding-table unicast-reverse-path",
            "graceful-restart",
            "instance-export",
            "instance-import",
            "nonstop-routing",
            "router-id",
        ]
        .iter()
        .map(|statement| format!("{}{}", DELETE_PREFIX, statement))
        .collect()
    }

    fn destroy_lines(&self, config: &Self::Config) -> Vec<String> {
        if config.clean_on_destroy {
            self.delete_lines(config)
        } else {
            Vec::new()
        }
    }

    fn show_path(&self, _config: &Self::Config) -> String {
        "routing-options".to_string()
    }

    fn read(&self, _key: &Self::Config, output: &str) -> Result<(Self::Config, ReadReport)> {
        let mut config = RoutingOptionsConfig::default();
        let report = RULES.read(&mut config, output)?;
        Ok((config, report))
    }

    fn from_import_id(&self, parts: &[String]) -> Result<Self::Config> {
        match parts {
            [id] if id == SINGLETON_ID => Ok(RoutingOptionsConfig::default()),
            _ => Err(Error::InvalidImportId {
                resource: Self::TYPE_NAME.to_string(),
                id: parts.join(""),
                expected: Self::ID_FORMAT.to_string(),
            }),
        }
    }

    fn checks_existence(&self) -> bool {
        false
    }

    fn carry_over(&self, prior: &Self::Config, read: &mut Self::Config) {
        read.clean_on_destroy = prior.clean_on_destroy;
    }
}
