/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use crate::types::{MetricBatch, MetricSample};

mod memory;
pub use memory::MemoryCollector;

/// Accumulates decoded metric samples until drained by a flush.
pub trait Collector {
    fn add_sample(&self, sample: MetricSample);

    /// Add a group of samples so that a concurrent flush sees either
    /// all of them or none of them.
    fn add_samples(&self, samples: Vec<MetricSample>) {
        for sample in samples {
            self.add_sample(sample);
        }
    }

    /// Return the samples accumulated since the previous flush and clear
    /// the buffer. A sample is never returned by two flushes.
    fn flush(&self) -> MetricBatch;
}

pub type ArcCollector = Arc<dyn Collector + Send + Sync>;
