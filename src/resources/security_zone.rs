//! `junos_security_zone`: `security zones security-zone <name>`

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::engine::text::has_configuration;
use crate::engine::validate;
use crate::engine::value::{quote, unquote};
use crate::engine::{Keyed, ReadReport, Resource, Rules};
use crate::error::{Error, Result};

/// Configuration of `junos_security_zone`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityZoneConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address_book: Vec<AddressBookEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address_book_set: Vec<AddressBookSet>,
    pub application_tracking: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbound_protocols: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbound_services: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interface: Vec<ZoneInterface>,
    pub reverse_reroute: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    pub source_identity_log: bool,
    pub tcp_rst: bool,
}

/// Entry of the zone's address book: a network or a DNS name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddressBookEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Keyed for AddressBookEntry {
    fn key(&self) -> &str {
        &self.name
    }

    fn with_key(key: &str) -> Self {
        Self {
            name: key.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddressBookSet {
    pub name: String,
    pub address: Vec<String>,
}

impl Keyed for AddressBookSet {
    fn key(&self) -> &str {
        &self.name
    }

    fn with_key(key: &str) -> Self {
        Self {
            name: key.to_string(),
            ..Default::default()
        }
    }
}

/// Interface bound to the zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneInterface {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbound_protocols: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbound_services: Vec<String>,
}

impl Keyed for ZoneInterface {
    fn key(&self) -> &str {
        &self.name
    }

    fn with_key(key: &str) -> Self {
        Self {
            name: key.to_string(),
            ..Default::default()
        }
    }
}

static ADDRESS_RULES: Lazy<Rules<AddressBookEntry>> = Lazy::new(|| {
    Rules::<AddressBookEntry>::new()
        .string("description", |a| &mut a.description)
        .string("dns-name", |a| &mut a.dns_name)
        .otherwise(|a, v| {
            let network = unquote(v);
            if !validate::is_network(&network) {
                return Ok(false);
            }
            a.network = Some(network);
            Ok(true)
        })
});

static ADDRESS_SET_RULES: Lazy<Rules<AddressBookSet>> =
    Lazy::new(|| Rules::<AddressBookSet>::new().list("address", |s| &mut s.address));

static INTERFACE_RULES: Lazy<Rules<ZoneInterface>> = Lazy::new(|| {
    Rules::<ZoneInterface>::new()
        .list("host-inbound-traffic protocols", |i| &mut i.inbound_protocols)
        .list("host-inbound-traffic system-services", |i| &mut i.inbound_services)
});

static RULES: Lazy<Rules<SecurityZoneConfig>> = Lazy::new(|| {
    Rules::<SecurityZoneConfig>::new()
        .keyed(
            "address-book address-set",
            |z| &mut z.address_book_set,
            &ADDRESS_SET_RULES,
        )
        .keyed("address-book address", |z| &mut z.address_book, &ADDRESS_RULES)
        .flag("application-tracking", |z| &mut z.application_tracking)
        .string("description", |z| &mut z.description)
        .list("host-inbound-traffic protocols", |z| &mut z.inbound_protocols)
        .list("host-inbound-traffic system-services", |z| &mut z.inbound_services)
        .keyed("interfaces", |z| &mut z.interface, &INTERFACE_RULES)
        .flag("reverse-reroute", |z| &mut z.reverse_reroute)
        .string("screen", |z| &mut z.screen)
        .flag("source-identity-log", |z| &mut z.source_identity_log)
        .flag("tcp-rst", |z| &mut z.tcp_rst)
});

/// Statements under the zone managed by this resource
const MANAGED_STATEMENTS: &[&str] = &[
    "address-book",
    "application-tracking",
    "description",
    "host-inbound-traffic",
    "interfaces",
    "reverse-reroute",
    "screen",
    "source-identity-log",
    "tcp-rst",
];

/// `junos_security_zone` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityZone;

impl SecurityZone {
    fn path(name: &str) -> String {
        format!("security zones security-zone {}", quote(name))
    }
}

impl Resource for SecurityZone {
    type Config = SecurityZoneConfig;

    const TYPE_NAME: &'static str = "junos_security_zone";
    const ID_FORMAT: &'static str = "<name>";

    fn id(&self, config: &Self::Config) -> String {
        config.name.clone()
    }

    fn validate(&self, config: &Self::Config, diags: &mut Diagnostics) {
        validate::name(diags, AttributePath::root("name"), &config.name);

        let book = AttributePath::root("address_book");
        validate::unique_keys(diags, book.clone(), &config.address_book);
        for (index, entry) in config.address_book.iter().enumerate() {
            let path = book.index(index);
            validate::name(diags, path.attr("name"), &entry.name);
            match (&entry.network, &entry.dns_name) {
                (Some(_), Some(_)) => diags.error_at(
                    path.attr("dns_name"),
                    "only one of network, dns_name can be set",
                ),
                (None, None) => diags.error_at(path, "one of network or dns_name must be set"),
                (Some(network), None) => validate::cidr(diags, path.attr("network"), network),
                (None, Some(dns_name)) => {
                    validate::dns_name(diags, path.attr("dns_name"), dns_name)
                }
            }
        }

        let sets = AttributePath::root("address_book_set");
        validate::unique_keys(diags, sets.clone(), &config.address_book_set);
        for (index, set) in config.address_book_set.iter().enumerate() {
            let path = sets.index(index);
            validate::name(diags, path.attr("name"), &set.name);
            if set.address.is_empty() {
                diags.error_at(path.attr("address"), "must not be empty");
            }
        }

        let interfaces = AttributePath::root("interface");
        validate::unique_keys(diags, interfaces.clone(), &config.interface);
        for (index, interface) in config.interface.iter().enumerate() {
            validate::name(diags, interfaces.index(index).attr("name"), &interface.name);
        }
    }

    fn set_lines(&self, config: &Self::Config) -> Result<Vec<String>> {
        let prefix = format!("set {}", Self::path(&config.name));
        let mut lines = vec![prefix.clone()];

        for (index, entry) in config.address_book.iter().enumerate() {
            let address = format!("{} address-book address {}", prefix, quote(&entry.name));
            match (&entry.network, &entry.dns_name) {
                (Some(network), None) => lines.push(format!("{} {}", address, network)),
                (None, Some(dns_name)) => {
                    lines.push(format!("{} dns-name {}", address, quote(dns_name)))
                }
                _ => {
                    return Err(Error::validation(
                        AttributePath::root("address_book").index(index),
                        "one of network or dns_name must be set",
                    ))
                }
            }
            if let Some(ref description) = entry.description {
                lines.push(format!("{} description {}", address, quote(description)));
            }
        }
        for set in &config.address_book_set {
            for address in &set.address {
                lines.push(format!(
                    "{} address-book address-set {} address {}",
                    prefix,
                    quote(&set.name),
                    quote(address)
                ));
            }
        }
        if config.application_tracking {
            lines.push(format!("{} application-tracking", prefix));
        }
        if let Some(ref description) = config.description {
            lines.push(format!("{} description {}", prefix, quote(description)));
        }
        for protocol in &config.inbound_protocols {
            lines.push(format!("{} host-inbound-traffic protocols {}", prefix, protocol));
        }
        for service in &config.inbound_services {
            lines.push(format!("{} host-inbound-traffic system-services {}", prefix, service));
        }
        for interface in &config.interface {
            let base = format!("{} interfaces {}", prefix, quote(&interface.name));
            lines.push(base.clone());
            for protocol in &interface.inbound_protocols {
                lines.push(format!("{} host-inbound-traffic protocols {}", base, protocol));
            }
            for service in &interface.inbound_services {
                lines.push(format!("{} host-inbound-traffic system-services {}", base, service));
            }
        }
        if config.reverse_reroute {
            lines.push(format!("{} reverse-reroute", prefix));
        }
        if let Some(ref screen) = config.screen {
            lines.push(format!("{} screen {}", prefix, quote(screen)));
        }
        if config.source_identity_log {
            lines.push(format!("{} source-identity-log", prefix));
        }
        if config.tcp_rst {
            lines.push(format!("{} tcp-rst", prefix));
        }

        Ok(lines)
    }

    fn delete_lines(&self, config: &Self::Config) -> Vec<String> {
        let prefix = format!("delete {}", Self::path(&config.name));
        MANAGED_STATEMENTS
            .iter()
            .map(|statement| format!("{} {}", prefix, statement))
            .collect()
    }

    fn destroy_lines(&self, config: &Self::Config) -> Vec<String> {
        vec![format!("delete {}", Self::path(&config.name))]
    }

    fn show_path(&self, config: &Self::Config) -> String {
        Self::path(&config.name)
    }

    fn read(&self, key: &Self::Config, output: &str) -> Result<(Self::Config, ReadReport)> {
        let mut config = SecurityZoneConfig::default();
        if has_configuration(output) {
            config.name = key.name.clone();
        }
        let report = RULES.read(&mut config, output)?;
        Ok((config, report))
    }

    fn from_import_id(&self, parts: &[String]) -> Result<Self::Config> {
        Ok(SecurityZoneConfig {
            name: parts.first().cloned().unwrap_or_default(),
            ..Default::default()
        })
    }

    fn requires_security(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn zone() -> SecurityZoneConfig {
        SecurityZoneConfig {
            name: "dmz".to_string(),
            description: Some("web facing".to_string()),
            address_book: vec![
                AddressBookEntry {
                    name: "web".to_string(),
                    network: Some("192.0.2.0/25".to_string()),
                    description: Some("web servers".to_string()),
                    ..Default::default()
                },
                AddressBookEntry {
                    name: "repo".to_string(),
                    dns_name: Some("repo.example.com".to_string()),
                    ..Default::default()
                },
            ],
            address_book_set: vec![AddressBookSet {
                name: "all".to_string(),
                address: vec!["web".to_string(), "repo".to_string()],
            }],
            application_tracking: true,
            inbound_protocols: vec!["bgp".to_string()],
            inbound_services: vec!["ping".to_string(), "ssh".to_string()],
            interface: vec![ZoneInterface {
                name: "ge-0/0/1.0".to_string(),
                inbound_services: vec!["dhcp".to_string()],
                ..Default::default()
            }],
            reverse_reroute: true,
            screen: Some("untrust-screen".to_string()),
            source_identity_log: true,
            tcp_rst: true,
        }
    }

    #[test]
    fn test_set_lines() {
        let lines = SecurityZone.set_lines(&zone()).unwrap();
        assert_eq!(lines[0], "set security zones security-zone dmz");
        assert_eq!(
            lines[1],
            "set security zones security-zone dmz address-book address web 192.0.2.0/25"
        );
        assert_eq!(
            lines[2],
            "set security zones security-zone dmz address-book address web description \"web servers\""
        );
        assert!(lines.contains(
            &"set security zones security-zone dmz interfaces ge-0/0/1.0 host-inbound-traffic system-services dhcp"
                .to_string()
        ));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("set security zones security-zone dmz tcp-rst")
        );
    }

    #[test]
    fn test_round_trip_ignores_unknown_lines() {
        let config = zone();
        let prefix = "set security zones security-zone dmz";
        let mut output = String::from("<configuration-output>\n");
        for line in SecurityZone.set_lines(&config).unwrap() {
            let relative = line.strip_prefix(prefix).unwrap().trim_start();
            output.push_str(&format!("set {}\n", relative).replace("set \n", "set\n"));
        }
        output.push_str("set enable-reverse-reroute-v2\n</configuration-output>\n");

        let (read, report) = SecurityZone.read(&config, &output).unwrap();
        assert_eq!(read, config);
        assert_eq!(report.unmatched, 1);
    }

    #[test]
    fn test_read_skips_other_address_forms() {
        let key = SecurityZoneConfig {
            name: "dmz".to_string(),
            ..Default::default()
        };
        let (read, report) = SecurityZone
            .read(
                &key,
                "set\n\
                 set address-book address web range-address 10.0.0.1 to 10.0.0.5\n\
                 set address-book address lan 192.0.2.0/24\n\
                 set address-book address lan wildcard-address 10.0.0.0/255.0.0.255\n\
                 set address-book address gw 192.0.2.1",
            )
            .unwrap();
        let networks: Vec<(&str, Option<&str>)> = read
            .address_book
            .iter()
            .map(|a| (a.name.as_str(), a.network.as_deref()))
            .collect();
        assert_eq!(
            networks,
            vec![("lan", Some("192.0.2.0/24")), ("gw", Some("192.0.2.1"))]
        );
        assert_eq!(report, ReadReport { matched: 2, unmatched: 2 });
    }

    #[test]
    fn test_interface_names_are_quoted() {
        let config = SecurityZoneConfig {
            name: "dmz".to_string(),
            interface: vec![ZoneInterface {
                name: "ge 0".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let lines = SecurityZone.set_lines(&config).unwrap();
        assert_eq!(lines[1], "set security zones security-zone dmz interfaces \"ge 0\"");
    }

    #[test]
    fn test_read_missing_zone() {
        let key = SecurityZoneConfig {
            name: "dmz".to_string(),
            ..Default::default()
        };
        let (read, _) = SecurityZone
            .read(&key, "<configuration-output>\n</configuration-output>")
            .unwrap();
        assert_eq!(SecurityZone.id(&read), "");
    }

    #[test]
    fn test_address_book_validation() {
        let mut config = zone();
        config.address_book[0].dns_name = Some("web.example.com".to_string());
        config.address_book[1].dns_name = None;
        config.address_book.push(AddressBookEntry {
            name: "web".to_string(),
            network: Some("198.51.100.0/24".to_string()),
            ..Default::default()
        });

        let mut diags = Diagnostics::new();
        SecurityZone.validate(&config, &mut diags);
        let paths: Vec<String> = diags
            .errors()
            .filter_map(|d| d.path.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(
            paths,
            vec![
                "address_book[2]",
                "address_book[0].dns_name",
                "address_book[1]",
            ]
        );
    }

    #[test]
    fn test_delete_and_destroy_lines() {
        let config = zone();
        assert_eq!(
            SecurityZone.destroy_lines(&config),
            vec!["delete security zones security-zone dmz"]
        );
        let deletes = SecurityZone.delete_lines(&config);
        assert_eq!(deletes.len(), MANAGED_STATEMENTS.len());
        assert_eq!(deletes[0], "delete security zones security-zone dmz address-book");
    }
}
