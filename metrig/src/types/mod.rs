/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

mod name;
pub use name::MetricName;

mod tag;
pub use tag::{MetricTagMap, MetricTagName, MetricTagValue};

mod value;
pub use value::MetricValue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty value")]
    Empty,
    #[error("invalid character {1:?} at offset {0}")]
    InvalidCharacter(usize, char),
}

/// Check for characters that are safe to use in metric names and tags.
fn check_chars(s: &str) -> Result<(), ParseError> {
    for (i, c) in s.char_indices() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '/' => {}
            c => return Err(ParseError::InvalidCharacter(i, c)),
        }
    }
    Ok(())
}

/// A single decoded metric observation.
#[derive(Clone, Debug)]
pub struct MetricSample {
    pub name: Arc<MetricName>,
    pub tag_map: Arc<MetricTagMap>,
    pub value: MetricValue,
    pub time: DateTime<Utc>,
}

/// The samples returned by one collector flush. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct MetricBatch {
    samples: Vec<MetricSample>,
}

impl MetricBatch {
    pub fn new(samples: Vec<MetricSample>) -> Self {
        MetricBatch { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    /// Count samples with exactly this name that carry the given tag.
    pub fn count_named(&self, name: &MetricName, tag_name: &str, tag_value: &str) -> usize {
        self.samples
            .iter()
            .filter(|s| s.name.as_ref() == name && s.tag_map.has(tag_name, tag_value))
            .count()
    }

    /// Count samples whose name starts with the given node prefix and
    /// that carry the given tag.
    pub fn count_prefixed(&self, prefix: &MetricName, tag_name: &str, tag_value: &str) -> usize {
        self.samples
            .iter()
            .filter(|s| s.name.starts_with(prefix) && s.tag_map.has(tag_name, tag_value))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample(name: &str, value: u64, tag: &str) -> MetricSample {
        let mut tag_map = MetricTagMap::default();
        tag_map.parse(tag).unwrap();
        MetricSample {
            name: Arc::new(MetricName::from_str(name).unwrap()),
            tag_map: Arc::new(tag_map),
            value: MetricValue::Unsigned(value),
            time: Utc::now(),
        }
    }

    #[test]
    fn batch_queries() {
        let batch = MetricBatch::new(vec![
            sample("jvm.thread_count", 48, "instance:solr_instance"),
            sample("jvm.heap_memory", 1024, "instance:solr_instance"),
            sample("jvm.heap_memory", 2048, "instance:other"),
            sample("solr.searcher.numdocs", 10, "instance:solr_instance"),
        ]);

        let thread_count = MetricName::from_str("jvm.thread_count").unwrap();
        assert_eq!(
            batch.count_named(&thread_count, "instance", "solr_instance"),
            1
        );

        let jvm = MetricName::from_str("jvm").unwrap();
        assert_eq!(batch.count_prefixed(&jvm, "instance", "solr_instance"), 2);

        let solr = MetricName::from_str("solr").unwrap();
        assert_eq!(batch.count_prefixed(&solr, "instance", "solr_instance"), 1);
    }

    #[test]
    fn bad_chars() {
        assert!(MetricName::from_str("jvm thread").is_err());
        assert!(MetricTagName::from_str("instance=x").is_err());
    }
}
