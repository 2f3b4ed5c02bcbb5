/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use memchr::memchr;

use super::{ParseError, check_chars};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricTagName(String);

impl MetricTagName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MetricTagName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        check_chars(s)?;
        Ok(MetricTagName(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricTagValue(String);

impl MetricTagValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for MetricTagValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_chars(s)?;
        Ok(MetricTagValue(s.to_string()))
    }
}

impl fmt::Display for MetricTagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MetricTagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricTagMap {
    inner: BTreeMap<MetricTagName, MetricTagValue>,
}

impl MetricTagMap {
    pub fn insert(&mut self, name: MetricTagName, value: MetricTagValue) {
        self.inner.insert(name, value);
    }

    pub fn has(&self, name: &str, value: &str) -> bool {
        self.inner
            .iter()
            .any(|(n, v)| n.as_str() == name && v.as_str() == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricTagName, &MetricTagValue)> {
        self.inner.iter()
    }

    /// Parse a single `name:value` tag string. A string without the `:`
    /// delimiter is taken as a tag name with an empty value.
    pub fn parse(&mut self, s: &str) -> anyhow::Result<()> {
        match memchr(b':', s.as_bytes()) {
            Some(p) => {
                let name = MetricTagName::from_str(&s[..p])
                    .map_err(|e| anyhow!("invalid tag name: {e}"))?;
                let value = MetricTagValue::from_str(&s[p + 1..])
                    .map_err(|e| anyhow!("invalid tag value: {e}"))?;
                self.inner.insert(name, value);
            }
            None => {
                let name =
                    MetricTagName::from_str(s).map_err(|e| anyhow!("invalid tag name: {e}"))?;
                self.inner.insert(name, MetricTagValue::default());
            }
        }
        Ok(())
    }
}

impl fmt::Display for MetricTagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.inner.iter();
        let Some((name, value)) = iter.next() else {
            return Ok(());
        };
        f.write_str(name.as_str())?;
        f.write_str(":")?;
        f.write_str(value.as_str())?;

        for (name, value) in iter {
            f.write_str(",")?;
            f.write_str(name.as_str())?;
            f.write_str(":")?;
            f.write_str(value.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kv() {
        let mut map = MetricTagMap::default();
        map.parse("instance:solr_instance").unwrap();
        map.parse("core:main").unwrap();
        map.parse("standalone").unwrap();

        assert!(map.has("instance", "solr_instance"));
        assert!(map.has("core", "main"));
        assert!(map.has("standalone", ""));
        assert!(!map.has("instance", "other"));

        assert_eq!(map.to_string(), "core:main,instance:solr_instance,standalone:");
    }

    #[test]
    fn parse_invalid() {
        let mut map = MetricTagMap::default();
        assert!(map.parse(":value").is_err());
        assert!(map.parse("na me:value").is_err());
    }
}
