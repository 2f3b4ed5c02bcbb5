/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Mutex;

use super::Collector;
use crate::types::{MetricBatch, MetricSample};

/// In-memory sample buffer. Samples are stored as received, without
/// any aggregation, and handed out wholesale on flush.
#[derive(Default)]
pub struct MemoryCollector {
    samples: Mutex<Vec<MetricSample>>,
}

impl Collector for MemoryCollector {
    fn add_sample(&self, sample: MetricSample) {
        let mut samples = self.samples.lock().unwrap();
        samples.push(sample);
    }

    fn add_samples(&self, mut new: Vec<MetricSample>) {
        let mut samples = self.samples.lock().unwrap();
        samples.append(&mut new);
    }

    fn flush(&self) -> MetricBatch {
        let mut samples = self.samples.lock().unwrap();
        MetricBatch::new(std::mem::take(&mut *samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricName, MetricTagMap, MetricValue};
    use chrono::Utc;
    use std::str::FromStr;
    use std::sync::Arc;

    fn sample(name: &str) -> MetricSample {
        MetricSample {
            name: Arc::new(MetricName::from_str(name).unwrap()),
            tag_map: Arc::new(MetricTagMap::default()),
            value: MetricValue::Unsigned(1),
            time: Utc::now(),
        }
    }

    #[test]
    fn flush_drains() {
        let collector = MemoryCollector::default();
        collector.add_sample(sample("jvm.thread_count"));
        collector.add_samples(vec![sample("solr.cache.hits"), sample("solr.cache.lookups")]);

        let batch = collector.flush();
        assert_eq!(batch.len(), 3);

        // nothing new arrived, so the next flush is empty
        assert!(collector.flush().is_empty());
    }
}
