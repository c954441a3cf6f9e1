//! `junos_static_route`: a static route of a routing instance
//!
//! IPv4 routes live in the default table (`routing-options static`), IPv6
//! routes in the `inet6.0` RIB of the instance.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::engine::text::has_configuration;
use crate::engine::validate;
use crate::engine::value::{parse_int, quote};
use crate::engine::{join_id, Keyed, Prerequisite, ReadReport, Resource, Rules};
use crate::error::{Error, Result};

use super::bgp_neighbor::DEFAULT_ROUTING_INSTANCE;

fn default_routing_instance() -> String {
    DEFAULT_ROUTING_INSTANCE.to_string()
}

/// Configuration of `junos_static_route`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticRouteConfig {
    pub destination: String,
    #[serde(default = "default_routing_instance")]
    pub routing_instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub next_hop: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualified_next_hop: Vec<QualifiedNextHop>,
    pub discard: bool,
    pub receive: bool,
    pub reject: bool,
    pub active: bool,
    pub passive: bool,
    pub install: bool,
    pub no_install: bool,
    pub readvertise: bool,
    pub no_readvertise: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub community: Vec<String>,
}

impl Default for StaticRouteConfig {
    fn default() -> Self {
        Self {
            destination: String::new(),
            routing_instance: default_routing_instance(),
            preference: None,
            metric: None,
            next_hop: Vec::new(),
            qualified_next_hop: Vec::new(),
            discard: false,
            receive: false,
            reject: false,
            active: false,
            passive: false,
            install: false,
            no_install: false,
            readvertise: false,
            no_readvertise: false,
            community: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualifiedNextHop {
    pub next_hop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<i64>,
}

impl Keyed for QualifiedNextHop {
    fn key(&self) -> &str {
        &self.next_hop
    }

    fn with_key(key: &str) -> Self {
        Self {
            next_hop: key.to_string(),
            ..Default::default()
        }
    }
}

static QUALIFIED_NEXT_HOP_RULES: Lazy<Rules<QualifiedNextHop>> = Lazy::new(|| {
    Rules::<QualifiedNextHop>::new()
        .string("interface", |q| &mut q.interface)
        .rule("metric", |q, v| {
            q.metric = Some(parse_int("qualified_next_hop.metric", v)?);
            Ok(())
        })
        .rule("preference", |q, v| {
            q.preference = Some(parse_int("qualified_next_hop.preference", v)?);
            Ok(())
        })
});

static RULES: Lazy<Rules<StaticRouteConfig>> = Lazy::new(|| {
    Rules::<StaticRouteConfig>::new()
        .rule("preference", |r, v| {
            r.preference = Some(parse_int("preference", v)?);
            Ok(())
        })
        .rule("metric", |r, v| {
            r.metric = Some(parse_int("metric", v)?);
            Ok(())
        })
        .list("next-hop", |r| &mut r.next_hop)
        .keyed(
            "qualified-next-hop",
            |r| &mut r.qualified_next_hop,
            &QUALIFIED_NEXT_HOP_RULES,
        )
        .flag("discard", |r| &mut r.discard)
        .flag("receive", |r| &mut r.receive)
        .flag("reject", |r| &mut r.reject)
        .flag("active", |r| &mut r.active)
        .flag("passive", |r| &mut r.passive)
        .flag("install", |r| &mut r.install)
        .flag("no-install", |r| &mut r.no_install)
        .flag("readvertise", |r| &mut r.readvertise)
        .flag("no-readvertise", |r| &mut r.no_readvertise)
        .list("community", |r| &mut r.community)
});

/// Whether the route renders anything besides its destination
fn has_statements(config: &StaticRouteConfig) -> bool {
    config.preference.is_some()
        || config.metric.is_some()
        || !config.next_hop.is_empty()
        || !config.qualified_next_hop.is_empty()
        || !config.community.is_empty()
        || [
            config.discard,
            config.receive,
            config.reject,
            config.active,
            config.passive,
            config.install,
            config.no_install,
            config.readvertise,
            config.no_readvertise,
        ]
        .contains(&true)
}

/// `junos_static_route` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRoute;

impl StaticRoute {
    fn route_path(config: &StaticRouteConfig) -> String {
        let ipv6 = config.destination.contains(':');
        let master = config.routing_instance == DEFAULT_ROUTING_INSTANCE;
        match (master, ipv6) {
            (true, false) => format!("routing-options static route {}", config.destination),
            (true, true) => format!(
                "routing-options rib inet6.0 static route {}",
                config.destination
            ),
            (false, false) => format!(
                "routing-instances {} routing-options static route {}",
                config.routing_instance, config.destination
            ),
            (false, true) => format!(
                "routing-instances {ri} routing-options rib {ri}.inet6.0 static route {}",
                config.destination,
                ri = config.routing_instance
            ),
        }
    }
}

impl Resource for StaticRoute {
    type Config = StaticRouteConfig;

    const TYPE_NAME: &'static str = "junos_static_route";
    const ID_FORMAT: &'static str = "<destination>_-_<routing_instance>";
    const ID_PARTS: usize = 2;

    fn id(&self, config: &Self::Config) -> String {
        join_id(&[&config.destination, &config.routing_instance])
    }

    fn validate(&self, config: &Self::Config, diags: &mut Diagnostics) {
        validate::cidr(diags, AttributePath::root("destination"), &config.destination);
        validate::name(diags, AttributePath::root("routing_instance"), &config.routing_instance);
        validate::range(diags, AttributePath::root("preference"), config.preference, 0, u32::MAX as i64);
        validate::range(diags, AttributePath::root("metric"), config.metric, 0, u32::MAX as i64);

        if !has_statements(config) {
            diags.error_at(
                AttributePath::root("destination"),
                "static route needs at least one statement",
            );
        }

        let root = AttributePath::empty();
        let has_next_hop = !config.next_hop.is_empty() || !config.qualified_next_hop.is_empty();
        validate::exclusive(
            diags,
            &root,
            &[
                ("next_hop", has_next_hop),
                ("discard", config.discard),
                ("receive", config.receive),
                ("reject", config.reject),
            ],
        );
        validate::exclusive(
            diags,
            &root,
            &[("active", config.active), ("passive", config.passive)],
        );
        validate::exclusive(
            diags,
            &root,
            &[("install", config.install), ("no_install", config.no_install)],
        );
        validate::exclusive(
            diags,
            &root,
            &[
                ("readvertise", config.readvertise),
                ("no_readvertise", config.no_readvertise),
            ],
        );

        for (index, next_hop) in config.next_hop.iter().enumerate() {
            // Interface names are valid next hops as well
            if next_hop.is_empty() {
                diags.error_at(AttributePath::root("next_hop").index(index), "must not be empty");
            }
        }
        let qualified = AttributePath::root("qualified_next_hop");
        validate::unique_keys(diags, qualified.clone(), &config.qualified_next_hop);
        for (index, hop) in config.qualified_next_hop.iter().enumerate() {
            let path = qualified.index(index);
            validate::name(diags, path.attr("next_hop"), &hop.next_hop);
            validate::range(diags, path.attr("metric"), hop.metric, 0, u32::MAX as i64);
            validate::range(diags, path.attr("preference"), hop.preference, 0, u32::MAX as i64);
        }
    }

    fn set_lines(&self, config: &Self::Config) -> Result<Vec<String>> {
        let prefix = format!("set {}", Self::route_path(config));
        let mut lines = Vec::new();

        if let Some(preference) = config.preference {
            lines.push(format!("{} preference {}", prefix, preference));
        }
        if let Some(metric) = config.metric {
            lines.push(format!("{} metric {}", prefix, metric));
        }
        for next_hop in &config.next_hop {
            lines.push(format!("{} next-hop {}", prefix, next_hop));
        }
        for hop in &config.qualified_next_hop {
            let base = format!("{} qualified-next-hop {}", prefix, hop.next_hop);
            lines.push(base.clone());
            if let Some(ref interface) = hop.interface {
                lines.push(format!("{} interface {}", base, interface));
            }
            if let Some(metric) = hop.metric {
                lines.push(format!("{} metric {}", base, metric));
            }
            if let Some(preference) = hop.preference {
                lines.push(format!("{} preference {}", base, preference));
            }
        }
        let flags = [
            (config.discard, "discard"),
            (config.receive, "receive"),
            (config.reject, "reject"),
            (config.active, "active"),
            (config.passive, "passive"),
            (config.install, "install"),
            (config.no_install, "no-install"),
            (config.readvertise, "readvertise"),
            (config.no_readvertise, "no-readvertise"),
        ];
        for (enabled, statement) in flags {
            if enabled {
                lines.push(format!("{} {}", prefix, statement));
            }
        }
        for community in &config.community {
            lines.push(format!("{} community {}", prefix, quote(community)));
        }

        if lines.is_empty() {
            return Err(Error::validation(
                AttributePath::root("destination"),
                "static route needs at least one statement",
            ));
        }
        Ok(lines)
    }

    fn delete_lines(&self, config: &Self::Config) -> Vec<String> {
        vec![format!("delete {}", Self::route_path(config))]
    }

    fn show_path(&self, config: &Self::Config) -> String {
        Self::route_path(config)
    }

    fn read(&self, key: &Self::Config, output: &str) -> Result<(Self::Config, ReadReport)> {
        let mut config = StaticRouteConfig::default();
        if has_configuration(output) {
            config.destination = key.destination.clone();
            config.routing_instance = key.routing_instance.clone();
        }
        let report = RULES.read(&mut config, output)?;
        Ok((config, report))
    }

    fn from_import_id(&self, parts: &[String]) -> Result<Self::Config> {
        match parts {
            [destination, routing_instance] => Ok(StaticRouteConfig {
                destination: destination.clone(),
                routing_instance: routing_instance.clone(),
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
        if config.routing_instance == DEFAULT_ROUTING_INSTANCE {
            return Vec::new();
        }
        vec![Prerequisite::new(
            format!("routing-instances {}", config.routing_instance),
            format!("routing instance {} doesn't exist", config.routing_instance),
        )]
    }
}
