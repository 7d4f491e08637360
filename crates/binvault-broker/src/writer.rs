//! Partitioned log writer.
//!
//! One long-lived producer session is shared by every concurrent write
//! request. Requests enter a bounded queue; a single worker task owns the
//! session, feeds records into it, and drains the shared success/error
//! completion streams, demultiplexing each completion back to its
//! originating caller through a oneshot correlated by token. A caller
//! blocks only on its own completion signal, and the full queue provides
//! natural backpressure.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use binvault_core::types::{Location, LogOffset, ObjectId, PartitionId};

use crate::backend::{LogBackend, ProducerAck, ProducerFailure, ProducerRecord, ProducerSession};
use crate::envelope;
use crate::error::{BrokerError, Result};
use crate::partitions;

/// Configuration for the log writer.
#[derive(Debug, Clone)]
pub struct LogWriterConfig {
    /// Topic all records are appended to.
    pub topic: String,
    /// Capacity of the internal produce queue.
    pub queue_capacity: usize,
    /// Sorted, deduplicated list of partitions excluded from writes.
    pub disabled_partitions: Vec<PartitionId>,
}

impl Default for LogWriterConfig {
    fn default() -> Self {
        Self {
            topic: "binvault".to_string(),
            queue_capacity: 64,
            disabled_partitions: Vec::new(),
        }
    }
}

type Completion = std::result::Result<Location, BrokerError>;

struct ProduceRequest {
    partition: PartitionId,
    payload: Bytes,
    done: oneshot::Sender<Completion>,
}

/// Shared writer over one producer session.
pub struct LogWriter {
    backend: Arc<dyn LogBackend>,
    config: LogWriterConfig,
    produce_tx: mpsc::Sender<ProduceRequest>,
}

impl LogWriter {
    /// Opens the producer session and starts the worker task.
    pub fn start(backend: Arc<dyn LogBackend>, config: LogWriterConfig) -> Result<Self> {
        let session = backend.open_producer(&config.topic)?;
        let (produce_tx, produce_rx) = mpsc::channel(config.queue_capacity);

        let worker = ProducerWorker {
            produce_rx,
            session,
            pending: HashMap::new(),
            next_token: 0,
        };
        tokio::spawn(worker.run());

        Ok(Self {
            backend,
            config,
            produce_tx,
        })
    }

    /// Picks a writable partition for the next record.
    ///
    /// Queries the log service for writable partitions, starts at a random
    /// index, and scans forward cyclically past any partition in the
    /// disabled set.
    pub async fn choose_partition(&self) -> Result<PartitionId> {
        let writable = self.backend.writable_partitions(&self.config.topic).await?;
        if writable.is_empty() {
            return Err(BrokerError::NoWritablePartition);
        }
        let start = rand::thread_rng().gen_range(0..writable.len());
        for step in 0..writable.len() {
            let candidate = writable[(start + step) % writable.len()];
            if !partitions::is_disabled(&self.config.disabled_partitions, candidate) {
                return Ok(candidate);
            }
        }
        Err(BrokerError::NoWritablePartition)
    }

    /// Appends one object to the log and returns its location.
    ///
    /// Blocks the calling task until the shared worker observes this
    /// record's completion.
    pub async fn produce(&self, id: ObjectId, payload: &[u8]) -> Result<Location> {
        let partition = self.choose_partition().await?;
        let envelope = envelope::pack(id, payload)?;
        let (done_tx, done_rx) = oneshot::channel();

        self.produce_tx
            .send(ProduceRequest {
                partition,
                payload: Bytes::from(envelope),
                done: done_tx,
            })
            .await
            .map_err(|_| BrokerError::SessionClosed)?;

        done_rx.await.map_err(|_| BrokerError::SessionClosed)?
    }

    /// Reads back the raw payload stored at `(partition, offset)`.
    pub async fn fetch(&self, partition: PartitionId, offset: LogOffset) -> Result<Vec<u8>> {
        let raw = self
            .backend
            .fetch_one(&self.config.topic, partition, offset)
            .await?;
        envelope::unpack(&raw)
    }
}

enum Event {
    Request(Option<ProduceRequest>),
    Ack(Option<ProducerAck>),
    Failure(Option<ProducerFailure>),
}

enum SubmitStep {
    Sent,
    InputClosed,
    Ack(Option<ProducerAck>),
    Failure(Option<ProducerFailure>),
}

/// Single owner of the producer session and its completion streams.
struct ProducerWorker {
    produce_rx: mpsc::Receiver<ProduceRequest>,
    session: ProducerSession,
    pending: HashMap<u64, oneshot::Sender<Completion>>,
    next_token: u64,
}

impl ProducerWorker {
    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                request = self.produce_rx.recv() => Event::Request(request),
                ack = self.session.acks.recv() => Event::Ack(ack),
                failure = self.session.failures.recv() => Event::Failure(failure),
            };
            match event {
                Event::Request(Some(request)) => {
                    if !self.submit(request).await {
                        break;
                    }
                }
                Event::Request(None) => {
                    debug!("produce queue closed, stopping writer worker");
                    break;
                }
                Event::Ack(Some(ack)) => self.complete_ack(ack),
                Event::Failure(Some(failure)) => self.complete_failure(failure),
                Event::Ack(None) | Event::Failure(None) => {
                    break;
                }
            }
        }
        self.fail_all_pending();
    }

    /// Feeds one record into the session input, draining completions the
    /// whole time so an in-flight burst can never deadlock the worker
    /// against a full input channel.
    async fn submit(&mut self, request: ProduceRequest) -> bool {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);

        let partition = request.partition;
        let mut record = Some(ProducerRecord {
            token,
            partition,
            payload: request.payload,
        });
        self.pending.insert(token, request.done);

        loop {
            let step = tokio::select! {
                permit = self.session.input.reserve() => match permit {
                    Ok(permit) => {
                        if let Some(record) = record.take() {
                            permit.send(record);
                        }
                        SubmitStep::Sent
                    }
                    Err(_) => SubmitStep::InputClosed,
                },
                ack = self.session.acks.recv() => SubmitStep::Ack(ack),
                failure = self.session.failures.recv() => SubmitStep::Failure(failure),
            };
            match step {
                SubmitStep::Sent => return true,
                SubmitStep::InputClosed => return false,
                SubmitStep::Ack(Some(ack)) => self.complete_ack(ack),
                SubmitStep::Failure(Some(failure)) => self.complete_failure(failure),
                SubmitStep::Ack(None) | SubmitStep::Failure(None) => return false,
            }
        }
    }

    fn complete_ack(&mut self, ack: ProducerAck) {
        if let Some(done) = self.pending.remove(&ack.token) {
            let _ = done.send(Ok(Location::new(ack.partition, ack.offset)));
        } else {
            warn!(token = ack.token, "ack for unknown produce token");
        }
    }

    fn complete_failure(&mut self, failure: ProducerFailure) {
        if let Some(done) = self.pending.remove(&failure.token) {
            let _ = done.send(Err(BrokerError::ProduceFailure {
                partition: failure.partition,
                reason: failure.reason,
            }));
        } else {
            warn!(token = failure.token, "error for unknown produce token");
        }
    }

    fn fail_all_pending(&mut self) {
        for (_, done) in self.pending.drain() {
            let _ = done.send(Err(BrokerError::SessionClosed));
        }
    }
}
