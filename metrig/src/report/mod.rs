/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::collect::ArcCollector;
use crate::types::MetricBatch;

/// Drains the collector on an interval and retains the last non-empty
/// batch for inspection.
///
/// The latest batch lives in an atomically swapped cell and the quit
/// flag is a watch channel, so the background loop and the checking
/// task get a race-free handoff.
pub struct Reporter {
    latest: Arc<ArcSwapOption<MetricBatch>>,
    quit: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Reporter {
    /// Start the flush loop in its own task and return immediately.
    pub fn spawn(collector: ArcCollector, flush_interval: Duration) -> Self {
        let latest = Arc::new(ArcSwapOption::new(None));
        let (quit, quit_receiver) = watch::channel(false);

        let store = latest.clone();
        let handle = tokio::spawn(run_flush_loop(
            collector,
            flush_interval,
            store,
            quit_receiver,
        ));

        Reporter {
            latest,
            quit,
            handle: Some(handle),
        }
    }

    /// The most recently observed non-empty batch, if any yet.
    pub fn latest(&self) -> Option<Arc<MetricBatch>> {
        self.latest.load_full()
    }

    /// Signal the flush loop to quit and wait for it to finish. The loop
    /// observes the signal within one flush interval. Safe to call more
    /// than once.
    pub async fn stop(&mut self) {
        let _ = self.quit.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!("reporter task error: {e}");
        }
    }
}

async fn run_flush_loop(
    collector: ArcCollector,
    flush_interval: Duration,
    store: Arc<ArcSwapOption<MetricBatch>>,
    mut quit_receiver: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;

            _ = quit_receiver.changed() => break,
            _ = tokio::time::sleep(flush_interval) => {
                let batch = collector.flush();
                if !batch.is_empty() {
                    debug!("reporter observed a batch of {} samples", batch.len());
                    // an empty flush never erases an observed batch
                    store.store(Some(Arc::new(batch)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{Collector, MemoryCollector};
    use crate::types::{MetricName, MetricSample, MetricTagMap, MetricValue};
    use chrono::Utc;
    use std::str::FromStr;

    fn sample(name: &str) -> MetricSample {
        MetricSample {
            name: Arc::new(MetricName::from_str(name).unwrap()),
            tag_map: Arc::new(MetricTagMap::default()),
            value: MetricValue::Unsigned(1),
            time: Utc::now(),
        }
    }

    async fn wait_latest(reporter: &Reporter) -> Arc<MetricBatch> {
        for _ in 0..100 {
            if let Some(batch) = reporter.latest() {
                return batch;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reporter observed no batch");
    }

    #[tokio::test]
    async fn keeps_last_non_empty_batch() {
        let collector = Arc::new(MemoryCollector::default());
        let mut reporter = Reporter::spawn(collector.clone(), Duration::from_millis(10));

        assert!(reporter.latest().is_none());

        collector.add_sample(sample("jvm.thread_count"));
        let batch = wait_latest(&reporter).await;
        assert_eq!(batch.len(), 1);

        // nothing new arrives, later empty flushes keep the old batch
        tokio::time::sleep(Duration::from_millis(50)).await;
        let batch = reporter.latest().unwrap();
        assert_eq!(batch.len(), 1);

        // a new non-empty flush overwrites it wholesale
        collector.add_samples(vec![sample("solr.cache.hits"), sample("solr.cache.lookups")]);
        for _ in 0..100 {
            if reporter.latest().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(reporter.latest().unwrap().len(), 2);

        reporter.stop().await;
        reporter.stop().await;
    }

    #[tokio::test]
    async fn stop_ends_flushing() {
        let collector = Arc::new(MemoryCollector::default());
        let mut reporter = Reporter::spawn(collector.clone(), Duration::from_millis(10));
        reporter.stop().await;

        collector.add_sample(sample("jvm.thread_count"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        // the loop is gone, the sample stays in the collector
        assert!(reporter.latest().is_none());
        assert_eq!(collector.flush().len(), 1);
    }
}
