//! 事件日志写入任务
//!
//! 引擎侧只做无阻塞的 channel 发送，落盘在后台任务里完成；
//! 收到停机信号后先排空队列再 flush。

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::engine::events::{Event, EventSink};
use crate::store::Store;

/// Engine-facing handle; cloning shares the same writer.
#[derive(Debug, Clone)]
pub struct EventLogSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSink for EventLogSink {
    fn emit(&self, event: Event) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(kind = e.0.kind.as_str(), "Event log writer gone, event dropped");
        }
    }
}

pub struct EventLogWriter {
    store: Arc<Store>,
    rx: mpsc::UnboundedReceiver<Event>,
    shutdown_rx: broadcast::Receiver<()>,
    written: u64,
}

impl EventLogWriter {
    pub fn spawn(
        store: Arc<Store>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> (EventLogSink, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = Self {
            store,
            rx,
            shutdown_rx,
            written: 0,
        };
        let handle = tokio::spawn(writer.run());
        (EventLogSink { tx }, handle)
    }

    async fn run(mut self) {
        tracing::info!("Event log writer started");
        loop {
            tokio::select! {
                maybe_event = self.rx.recv() => match maybe_event {
                    Some(event) => self.write(&event),
                    None => break,
                },
                _ = self.shutdown_rx.recv() => {
                    self.drain();
                    break;
                }
            }
        }

        if let Err(e) = self.store.flush() {
            tracing::error!(error = %e, "Failed to flush event log");
        }
        tracing::info!(written = self.written, "Event log writer stopped");
    }

    fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.write(&event);
        }
    }

    fn write(&mut self, event: &Event) {
        match self.store.append_event(event) {
            Ok(record) => {
                self.written += 1;
                tracing::debug!(id = record.id, kind = %record.event_type, "Event logged");
            }
            Err(e) => {
                tracing::error!(error = %e, kind = event.kind.as_str(), "Failed to persist event")
            }
        }
    }
}
