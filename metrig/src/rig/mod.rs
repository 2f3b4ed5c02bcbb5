/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::debug;

use crate::collect::{ArcCollector, MemoryCollector};
use crate::import::{ImporterConfig, ImporterHandle};
use crate::poll::{PollDaemon, PollDaemonConfig};
use crate::report::Reporter;
use crate::types::MetricBatch;
use crate::wait::{WaitTimeout, wait_for};

const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RigState {
    Running,
    TornDown,
}

/// Wires a full pipeline together: ingress server feeding a collector,
/// a poll daemon emitting toward the ingress port, and a reporter
/// draining the collector.
pub struct PipelineRig {
    importer: ImporterHandle,
    daemon: PollDaemon,
    reporter: Reporter,
    state: RigState,
}

impl PipelineRig {
    /// Start all three units. The daemon is pointed at the address the
    /// ingress server actually bound.
    pub async fn start(
        importer_config: ImporterConfig,
        daemon_config: PollDaemonConfig,
        flush_interval: Duration,
    ) -> anyhow::Result<Self> {
        let collector: ArcCollector = Arc::new(MemoryCollector::default());

        let importer = ImporterHandle::spawn(importer_config, collector.clone())
            .await
            .context("failed to start ingress server")?;
        let daemon = PollDaemon::spawn(daemon_config, importer.local_addr())
            .await
            .context("failed to start poll daemon")?;
        let reporter = Reporter::spawn(collector, flush_interval);

        Ok(PipelineRig {
            importer,
            daemon,
            reporter,
            state: RigState::Running,
        })
    }

    /// Wait until the reporter has observed a non-empty batch, polling
    /// once per second within the given time budget.
    pub async fn wait_for_batch(&self, budget: Duration) -> Result<Arc<MetricBatch>, WaitTimeout> {
        wait_for(budget, WAIT_POLL_INTERVAL, || self.reporter.latest()).await
    }

    /// Stop all units and wait for their tasks to finish. Runs in any
    /// state and is safe to call more than once.
    pub async fn shutdown(&mut self) {
        if self.state == RigState::TornDown {
            return;
        }
        self.state = RigState::TornDown;

        self.importer.stop().await;
        self.reporter.stop().await;
        self.daemon.terminate().await;
        debug!("pipeline rig torn down");
    }
}
