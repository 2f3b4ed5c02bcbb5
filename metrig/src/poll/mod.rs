/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use anyhow::Context;
use log::{debug, info, warn};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

mod config;
pub use config::{EmitMetric, PollDaemonConfig};

/// Stand-in for an external metrics poller: emits the configured metric
/// set toward the ingress port on every interval tick, first tick
/// immediately after spawn.
pub struct PollDaemon {
    quit: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl PollDaemon {
    pub async fn spawn(config: PollDaemonConfig, target: SocketAddr) -> anyhow::Result<Self> {
        let bind_ip = match target {
            SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0))
            .await
            .context("failed to bind emit socket")?;
        socket
            .connect(target)
            .await
            .context(format!("failed to connect emit socket to {target}"))?;

        for metric in config.metrics() {
            debug!(
                "will emit {} = {} ({})",
                metric.name, metric.value, metric.tag_map
            );
        }

        let (quit, quit_receiver) = watch::channel(false);
        let runtime = EmitRuntime {
            socket,
            target,
            packet: encode_packet(&config),
            config,
        };
        let handle = tokio::spawn(runtime.into_running(quit_receiver));

        Ok(PollDaemon {
            quit,
            handle: Some(handle),
        })
    }

    /// Request the daemon to stop and wait until its task has finished.
    /// Safe to call more than once.
    pub async fn terminate(&mut self) {
        let _ = self.quit.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!("poll daemon task error: {e}");
        }
    }
}

struct EmitRuntime {
    socket: UdpSocket,
    target: SocketAddr,
    packet: Vec<u8>,
    config: PollDaemonConfig,
}

impl EmitRuntime {
    async fn into_running(self, mut quit_receiver: watch::Receiver<bool>) {
        info!(
            "started poll daemon for instance {}, target {}",
            self.config.instance(),
            self.target
        );

        let mut emit_interval = tokio::time::interval(self.config.emit_interval);
        loop {
            tokio::select! {
                biased;

                _ = quit_receiver.changed() => break,
                _ = emit_interval.tick() => self.emit_cycle().await,
            }
        }

        info!(
            "stopped poll daemon for instance {}",
            self.config.instance()
        );
    }

    async fn emit_cycle(&self) {
        match self.socket.send(&self.packet).await {
            Ok(_) => debug!(
                "emitted {} metrics to {}",
                self.config.metrics().len(),
                self.target
            ),
            Err(e) => warn!("failed to send metrics packet to {}: {e}", self.target),
        }
    }
}

/// Encode one poll cycle as a single datagram, one json record per line,
/// so that the whole cycle reaches the collector in one piece.
fn encode_packet(config: &PollDaemonConfig) -> Vec<u8> {
    let mut buf = Vec::new();
    for metric in config.metrics() {
        let tags: Vec<String> = metric
            .tag_map
            .iter()
            .map(|(n, v)| format!("{}:{}", n.as_str(), v.as_str()))
            .collect();
        let record = serde_json::json!({
            "metric": metric.name.to_string(),
            "value": metric.value.as_json_number(),
            "tags": tags,
        });
        buf.extend_from_slice(record.to_string().as_bytes());
        buf.push(b'\n');
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn emit_configured_metrics() {
        let config = PollDaemonConfig::load_str(
            r#"
instance: solr_instance
interval: 30
metrics:
  - name: jvm.thread_count
    value: 48
  - name: solr.cache.hits
    value: 9000
"#,
        )
        .unwrap();

        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let mut daemon = PollDaemon::spawn(config, target).await.unwrap();

        let mut buf = [0u8; u16::MAX as usize];
        let len = tokio::time::timeout(Duration::from_secs(5), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();

        let lines: Vec<&[u8]> = buf[..len]
            .split(|b| *b == b'\n')
            .filter(|l| !l.is_empty())
            .collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let v: serde_json::Value = serde_json::from_slice(line).unwrap();
            let tags = v.get("tags").unwrap().as_array().unwrap();
            assert!(tags.contains(&serde_json::Value::String("instance:solr_instance".into())));
        }

        daemon.terminate().await;
        daemon.terminate().await;
    }
}
