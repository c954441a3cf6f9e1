//! Resource identifiers
//!
//! Composite identifiers join their components with [`ID_SEPARATOR`], for
//! instance `192.0.2.1_-_master_-_ext` for a BGP neighbor.

use crate::error::{Error, Result};

/// Separator between the components of a composite identifier
pub const ID_SEPARATOR: &str = "_-_";

/// Join identifier components; empty when the first component is empty
pub fn join_id(parts: &[&str]) -> String {
    match parts.first() {
        None => String::new(),
        Some(first) if first.is_empty() => String::new(),
        Some(_) => parts.join(ID_SEPARATOR),
    }
}

/// Split an import identifier into `count` components
///
/// Fewer components is an error; the last component keeps any extra
/// separators.
pub fn split_id(resource: &str, id: &str, count: usize, expected: &str) -> Result<Vec<String>> {
    let parts: Vec<String> = id.splitn(count, ID_SEPARATOR).map(str::to_string).collect();
    if parts.len() < count || parts.iter().any(String::is_empty) {
        return Err(Error::InvalidImportId {
            resource: resource.to_string(),
            id: id.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_id() {
        assert_eq!(join_id(&["192.0.2.1", "master", "ext"]), "192.0.2.1_-_master_-_ext");
        assert_eq!(join_id(&["trust"]), "trust");
        assert_eq!(join_id(&["", "master"]), "");
        assert_eq!(join_id(&[]), "");
    }

    #[test]
    fn test_split_id() {
        let parts = split_id("junos_bgp_neighbor", "192.0.2.1_-_master_-_ext", 3, "<ip>_-_<ri>_-_<group>")
            .unwrap();
        assert_eq!(parts, vec!["192.0.2.1", "master", "ext"]);

        let err = split_id("junos_bgp_neighbor", "192.0.2.1_-_master", 3, "<ip>_-_<ri>_-_<group>")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid import id '192.0.2.1_-_master' for 'junos_bgp_neighbor': expected <ip>_-_<ri>_-_<group>"
        );

        assert!(split_id("junos_static_route", "_-_master", 2, "<dest>_-_<ri>").is_err());
        assert_eq!(
            split_id("junos_static_route", "10.0.0.0/8_-_a_-_b", 2, "<dest>_-_<ri>").unwrap(),
            vec!["10.0.0.0/8", "a_-_b"]
        );
    }
}
