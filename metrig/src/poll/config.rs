/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

use crate::types::{MetricName, MetricTagMap, MetricTagName, MetricTagValue, MetricValue};

const CONFIG_KEY_INSTANCE: &str = "instance";

/// One metric the daemon reports on every poll cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitMetric {
    pub(super) name: MetricName,
    pub(super) value: MetricValue,
    pub(super) tag_map: MetricTagMap,
}

impl EmitMetric {
    fn parse(map: &yaml::Hash) -> anyhow::Result<Self> {
        let mut name: Option<MetricName> = None;
        let mut value: Option<MetricValue> = None;
        let mut tag_map = MetricTagMap::default();

        foreach_kv(map, |k, v| match k {
            "name" => {
                let s = as_str(v)?;
                name = Some(MetricName::from_str(s).map_err(|e| anyhow!("invalid name: {e}"))?);
                Ok(())
            }
            "value" => {
                value = Some(as_metric_value(v)?);
                Ok(())
            }
            "tags" => {
                let Yaml::Array(seq) = v else {
                    return Err(anyhow!("yaml value type should be a sequence"));
                };
                for tag in seq {
                    tag_map.parse(as_str(tag)?)?;
                }
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;

        let name = name.ok_or_else(|| anyhow!("name is not set"))?;
        let value = value.ok_or_else(|| anyhow!("value is not set"))?;
        Ok(EmitMetric {
            name,
            value,
            tag_map,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollDaemonConfig {
    instance: MetricTagValue,
    pub(super) emit_interval: Duration,
    metrics: Vec<EmitMetric>,
}

impl PollDaemonConfig {
    fn new() -> Self {
        PollDaemonConfig {
            instance: MetricTagValue::default(),
            emit_interval: Duration::from_secs(1),
            metrics: Vec::new(),
        }
    }

    /// Load the daemon config from a YAML file inside the `ci`
    /// subdirectory of a fixture directory.
    pub fn load_fixture(fixture_dir: &Path, file: &str) -> anyhow::Result<Self> {
        Self::load_file(&fixture_dir.join("ci").join(file))
    }

    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("failed to read config file {}", path.display()))?;
        Self::load_str(&content).context(format!("invalid config file {}", path.display()))
    }

    pub fn load_str(content: &str) -> anyhow::Result<Self> {
        let docs = YamlLoader::load_from_str(content).context("invalid yaml")?;
        let doc = docs.first().ok_or_else(|| anyhow!("no yaml document"))?;
        let Yaml::Hash(map) = doc else {
            return Err(anyhow!("the yaml root should be a hash"));
        };
        Self::parse(map)
    }

    fn parse(map: &yaml::Hash) -> anyhow::Result<Self> {
        let mut config = PollDaemonConfig::new();
        foreach_kv(map, |k, v| config.set(k, v))?;
        config.check()?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match k {
            CONFIG_KEY_INSTANCE => {
                self.instance = MetricTagValue::from_str(as_str(v)?)
                    .map_err(|e| anyhow!("invalid instance value: {e}"))?;
                Ok(())
            }
            "interval" => {
                let seconds = v
                    .as_i64()
                    .ok_or_else(|| anyhow!("yaml value type should be an integer"))?;
                if seconds <= 0 {
                    return Err(anyhow!("interval should be positive"));
                }
                self.emit_interval = Duration::from_secs(seconds as u64);
                Ok(())
            }
            "metrics" => {
                let Yaml::Array(seq) = v else {
                    return Err(anyhow!("yaml value type should be a sequence"));
                };
                for (i, entry) in seq.iter().enumerate() {
                    let Yaml::Hash(map) = entry else {
                        return Err(anyhow!("yaml value type for metric #{i} should be a hash"));
                    };
                    let metric = EmitMetric::parse(map).context(format!("invalid metric #{i}"))?;
                    self.metrics.push(metric);
                }
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn check(&mut self) -> anyhow::Result<()> {
        if self.instance.is_empty() {
            return Err(anyhow!("instance is not set"));
        }
        if self.metrics.is_empty() {
            return Err(anyhow!("no metrics set"));
        }

        // every emitted sample carries the instance tag
        let tag_name = MetricTagName::from_str(CONFIG_KEY_INSTANCE).unwrap();
        for metric in &mut self.metrics {
            metric
                .tag_map
                .insert(tag_name.clone(), self.instance.clone());
        }
        Ok(())
    }

    pub fn instance(&self) -> &MetricTagValue {
        &self.instance
    }

    pub fn metrics(&self) -> &[EmitMetric] {
        &self.metrics
    }
}

fn foreach_kv<F>(map: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in map.iter() {
        let Yaml::String(key) = k else {
            return Err(anyhow!("the yaml hash key should be a string"));
        };
        f(key, v).context(format!("invalid value for key {key}"))?;
    }
    Ok(())
}

fn as_str(v: &Yaml) -> anyhow::Result<&str> {
    v.as_str()
        .ok_or_else(|| anyhow!("yaml value type should be a string"))
}

fn as_metric_value(v: &Yaml) -> anyhow::Result<MetricValue> {
    match v {
        Yaml::Integer(i) => Ok(MetricValue::Signed(*i)),
        Yaml::Real(s) => MetricValue::from_str(s),
        Yaml::String(s) => MetricValue::from_str(s),
        _ => Err(anyhow!("yaml value type should be a number or a string")),
    }
}
