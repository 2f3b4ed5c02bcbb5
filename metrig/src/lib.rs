/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Bounded-wait integration rig for an asynchronous metrics pipeline.
//!
//! A [`import::ImporterHandle`] receives metric datagrams on a UDP port
//! and feeds a [`collect::Collector`]. A [`poll::PollDaemon`] emits a
//! configured metric set toward that port on an interval. A
//! [`report::Reporter`] drains the collector periodically and keeps the
//! last non-empty [`types::MetricBatch`] for inspection. [`rig::PipelineRig`]
//! wires the three together with guaranteed join-on-stop teardown, and
//! [`wait::wait_for`] bounds the wait for metrics to show up.

pub mod collect;
pub mod import;
pub mod poll;
pub mod report;
pub mod rig;
pub mod types;
pub mod wait;
