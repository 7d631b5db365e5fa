use crate::domain::model::Zone;
use std::collections::HashMap;

/// Two-character postal prefix to zone mapping. Built once and shared read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTable {
    prefixes: HashMap<String, Zone>,
}

impl ZoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 後設定的前綴會覆蓋先前的對應
    pub fn with_prefixes<'a, I>(mut self, zone: Zone, prefixes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for prefix in prefixes {
            self.prefixes.insert(prefix.to_string(), zone);
        }
        self
    }

    pub fn get(&self, prefix: &str) -> Option<Zone> {
        self.prefixes.get(prefix).copied()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ZoneResolver {
    table: ZoneTable,
}

impl ZoneResolver {
    pub fn new(table: ZoneTable) -> Self {
        Self { table }
    }

    /// Never fails: empty, short or unknown codes fall back to [`Zone::DEFAULT`].
    pub fn resolve(&self, postal_code: &str) -> Zone {
        let prefix: String = postal_code.trim().chars().take(2).collect();
        if prefix.chars().count() < 2 {
            return Zone::DEFAULT;
        }
        self.table.get(&prefix).unwrap_or(Zone::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ZoneResolver {
        ZoneResolver::new(
            ZoneTable::new()
                .with_prefixes(Zone::METRO, ["01", "03"])
                .with_prefixes(Zone::SECONDARY, ["44"])
                .with_prefixes(Zone::REMOTE, ["97"]),
        )
    }

    #[test]
    fn test_resolve_mapped_prefixes() {
        let r = resolver();
        assert_eq!(r.resolve("03100"), Zone::METRO);
        assert_eq!(r.resolve("44100"), Zone::SECONDARY);
        assert_eq!(r.resolve("97000"), Zone::REMOTE);
    }

    #[test]
    fn test_unmapped_and_malformed_default_to_zone_3() {
        let r = resolver();
        assert_eq!(r.resolve("80000"), Zone::DEFAULT);
        assert_eq!(r.resolve(""), Zone::DEFAULT);
        assert_eq!(r.resolve("0"), Zone::DEFAULT);
        assert_eq!(r.resolve("ñ"), Zone::DEFAULT);
        assert_eq!(r.resolve("  03100  "), Zone::METRO);
    }

    #[test]
    fn test_resolution_is_total() {
        let r = resolver();
        for code in ["00000", "99999", "ABCDE", "💥💥", "1"] {
            let zone = r.resolve(code).number();
            assert!((1..=4).contains(&zone));
        }
    }
}
