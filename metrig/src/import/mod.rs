/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use log::{debug, info, warn};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::collect::ArcCollector;
use crate::types::MetricSample;

mod json;
use json::RecordVisitor;

#[derive(Clone, Debug)]
pub struct ImporterConfig {
    pub listen: SocketAddr,
}

/// Handle to a running ingress server. The server keeps receiving until
/// [`ImporterHandle::stop`] is called or the handle is dropped.
pub struct ImporterHandle {
    listen_addr: SocketAddr,
    quit: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ImporterHandle {
    /// Bind the listen socket and start the receive loop in its own task.
    pub async fn spawn(config: ImporterConfig, collector: ArcCollector) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(config.listen)
            .await
            .context(format!("failed to bind udp socket to {}", config.listen))?;
        let listen_addr = socket
            .local_addr()
            .context("failed to get local listen address")?;

        let (quit, quit_receiver) = watch::channel(false);
        let runtime = ReceiveRuntime {
            socket,
            listen_addr,
            collector,
        };
        let handle = tokio::spawn(runtime.into_running(quit_receiver));

        Ok(ImporterHandle {
            listen_addr,
            quit,
            handle: Some(handle),
        })
    }

    /// The address the server actually bound, useful with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Signal the receive loop to quit and wait for it to finish.
    /// Safe to call more than once.
    pub async fn stop(&mut self) {
        let _ = self.quit.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!("ingress server on {} task error: {e}", self.listen_addr);
        }
    }
}

struct ReceiveRuntime {
    socket: UdpSocket,
    listen_addr: SocketAddr,
    collector: ArcCollector,
}

impl ReceiveRuntime {
    async fn into_running(self, mut quit_receiver: watch::Receiver<bool>) {
        info!("started ingress server on {}", self.listen_addr);

        let mut buf = [0u8; u16::MAX as usize];
        loop {
            tokio::select! {
                biased;

                _ = quit_receiver.changed() => break,
                r = self.socket.recv_from(&mut buf) => {
                    match r {
                        Ok((len, peer_addr)) => self.receive_packet(&buf[..len], peer_addr),
                        Err(e) => {
                            warn!("ingress server on {} recv error: {e}", self.listen_addr);
                        }
                    }
                }
            }
        }

        info!("stopped ingress server on {}", self.listen_addr);
    }

    fn receive_packet(&self, packet: &[u8], peer_addr: SocketAddr) {
        let time = Utc::now();
        let mut samples = Vec::new();
        for r in RecordVisitor::new(packet) {
            match r {
                Ok((name, tag_map, value)) => samples.push(MetricSample {
                    name: Arc::new(name),
                    tag_map: Arc::new(tag_map),
                    value,
                    time,
                }),
                Err(e) => {
                    debug!("dropped invalid record from {peer_addr}: {e}");
                }
            }
        }
        if !samples.is_empty() {
            self.collector.add_samples(samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{Collector, MemoryCollector};
    use std::time::Duration;

    #[tokio::test]
    async fn receive_and_forward() {
        let collector = Arc::new(MemoryCollector::default());
        let config = ImporterConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
        };
        let mut importer = ImporterHandle::spawn(config, collector.clone())
            .await
            .unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let packet = b"{\"metric\":\"jvm.thread_count\",\"value\":48,\"tags\":[\"instance:solr_instance\"]}\n\
            garbage line\n\
            {\"metric\":\"solr.cache.hits\",\"value\":9000,\"tags\":[\"instance:solr_instance\"]}";
        client
            .send_to(packet, importer.local_addr())
            .await
            .unwrap();

        // allow the receive loop to pick the datagram up
        let mut batch = collector.flush();
        for _ in 0..50 {
            if !batch.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            batch = collector.flush();
        }

        assert_eq!(batch.len(), 2);
        let mut names: Vec<String> = batch.iter().map(|s| s.name.to_string()).collect();
        names.sort();
        assert_eq!(names, ["jvm.thread_count", "solr.cache.hits"]);

        importer.stop().await;
        // double stop is a no-op
        importer.stop().await;
    }
}
