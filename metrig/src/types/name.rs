/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::{self, Write};
use std::str::FromStr;

use super::{ParseError, check_chars};

/// A dotted hierarchical metric name such as `jvm.thread_count`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricName {
    nodes: Vec<String>,
}

impl MetricName {
    /// Node-wise prefix check: `jvm` matches `jvm.thread_count`
    /// but not `jvmx.thread_count`.
    pub fn starts_with(&self, prefix: &MetricName) -> bool {
        if prefix.nodes.len() > self.nodes.len() {
            return false;
        }
        self.nodes
            .iter()
            .zip(prefix.nodes.iter())
            .all(|(a, b)| a == b)
    }
}

impl FromStr for MetricName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut nodes = Vec::new();
        for node in s.split('.') {
            if node.is_empty() {
                return Err(ParseError::Empty);
            }
            check_chars(node)?;
            nodes.push(node.to_string());
        }

        Ok(MetricName { nodes })
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.nodes.iter();
        let Some(n) = iter.next() else {
            return Ok(());
        };
        f.write_str(n)?;
        for n in iter {
            f.write_char('.')?;
            f.write_str(n)?;
        }
        Ok(())
    }
}
