//! Partitioned log service interface.
//!
//! The backend exposes the three primitives the log writer needs: the set
//! of currently writable partitions, an asynchronous producer session
//! whose completions arrive on shared success/error streams correlated by
//! an opaque token, and a single-record fetch at an exact offset. The
//! in-memory implementation backs tests and local development.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::mpsc;

use binvault_core::types::{LogOffset, PartitionId};

use crate::error::{BrokerError, Result};
use crate::BoxFuture;

/// One record handed to the asynchronous producer.
#[derive(Debug)]
pub struct ProducerRecord {
    /// Caller-chosen correlation token echoed back in the completion.
    pub token: u64,
    /// Destination partition.
    pub partition: PartitionId,
    /// Serialized record envelope.
    pub payload: Bytes,
}

/// Successful produce completion.
#[derive(Debug, Clone, Copy)]
pub struct ProducerAck {
    /// Correlation token of the originating record.
    pub token: u64,
    /// Partition the record landed on.
    pub partition: PartitionId,
    /// Offset assigned by the log service.
    pub offset: LogOffset,
}

/// Failed produce completion.
#[derive(Debug, Clone)]
pub struct ProducerFailure {
    /// Correlation token of the originating record.
    pub token: u64,
    /// Partition the record was destined for.
    pub partition: PartitionId,
    /// Failure detail from the log service.
    pub reason: String,
}

/// One long-lived asynchronous producer session.
///
/// The input sender and the two completion receivers belong to exactly one
/// owner; the log writer's worker task holds all three for the life of the
/// session.
pub struct ProducerSession {
    /// Records to append.
    pub input: mpsc::Sender<ProducerRecord>,
    /// Success completions, in the order the service acknowledged them.
    pub acks: mpsc::Receiver<ProducerAck>,
    /// Error completions.
    pub failures: mpsc::Receiver<ProducerFailure>,
}

/// Partitioned append-only log collaborator.
pub trait LogBackend: Send + Sync {
    /// Lists the partitions of `topic` currently accepting writes.
    fn writable_partitions(&self, topic: &str) -> BoxFuture<'_, Result<Vec<PartitionId>>>;

    /// Opens the shared asynchronous producer session for `topic`.
    fn open_producer(&self, topic: &str) -> Result<ProducerSession>;

    /// Fetches the single record stored at `(partition, offset)`.
    ///
    /// Implementations open a short-lived connection to the partition
    /// leader and return the stored envelope bytes.
    fn fetch_one(
        &self,
        topic: &str,
        partition: PartitionId,
        offset: LogOffset,
    ) -> BoxFuture<'_, Result<Vec<u8>>>;
}

/// In-memory log backend for tests and local development.
pub struct MemoryLog {
    partitions: Arc<Mutex<Vec<Vec<Bytes>>>>,
    writable: Mutex<Vec<PartitionId>>,
    fail_produce: Arc<AtomicBool>,
    produced: Arc<AtomicU64>,
}

impl MemoryLog {
    /// Creates a log with `partition_count` partitions, all writable.
    pub fn new(partition_count: usize) -> Self {
        Self {
            partitions: Arc::new(Mutex::new(vec![Vec::new(); partition_count])),
            writable: Mutex::new((0..partition_count as PartitionId).collect()),
            fail_produce: Arc::new(AtomicBool::new(false)),
            produced: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Overrides the writable partition set.
    pub fn set_writable(&self, partitions: Vec<PartitionId>) {
        *self.writable.lock().unwrap() = partitions;
    }

    /// Makes every subsequent produce complete with an error.
    pub fn set_fail_produce(&self, fail: bool) {
        self.fail_produce.store(fail, Ordering::SeqCst);
    }

    /// Total records appended across all partitions.
    pub fn record_count(&self) -> u64 {
        self.produced.load(Ordering::SeqCst)
    }
}

impl LogBackend for MemoryLog {
    fn writable_partitions(&self, _topic: &str) -> BoxFuture<'_, Result<Vec<PartitionId>>> {
        Box::pin(async move { Ok(self.writable.lock().unwrap().clone()) })
    }

    fn open_producer(&self, _topic: &str) -> Result<ProducerSession> {
        let (input_tx, mut input_rx) = mpsc::channel::<ProducerRecord>(64);
        let (ack_tx, ack_rx) = mpsc::channel(64);
        let (failure_tx, failure_rx) = mpsc::channel(64);

        let partitions = Arc::clone(&self.partitions);
        let fail_produce = Arc::clone(&self.fail_produce);
        let produced = Arc::clone(&self.produced);

        tokio::spawn(async move {
            while let Some(record) = input_rx.recv().await {
                if fail_produce.load(Ordering::SeqCst) {
                    let failure = ProducerFailure {
                        token: record.token,
                        partition: record.partition,
                        reason: "injected produce failure".to_string(),
                    };
                    if failure_tx.send(failure).await.is_err() {
                        break;
                    }
                    continue;
                }

                let appended = {
                    let mut parts = partitions.lock().unwrap();
                    match parts.get_mut(record.partition as usize) {
                        Some(part) => {
                            part.push(record.payload);
                            Some((part.len() - 1) as LogOffset)
                        }
                        None => None,
                    }
                };

                let completion = match appended {
                    Some(offset) => {
                        produced.fetch_add(1, Ordering::SeqCst);
                        ack_tx
                            .send(ProducerAck {
                                token: record.token,
                                partition: record.partition,
                                offset,
                            })
                            .await
                            .is_ok()
                    }
                    None => failure_tx
                        .send(ProducerFailure {
                            token: record.token,
                            partition: record.partition,
                            reason: format!("unknown partition {}", record.partition),
                        })
                        .await
                        .is_ok(),
                };
                if !completion {
                    break;
                }
            }
        });

        Ok(ProducerSession {
            input: input_tx,
            acks: ack_rx,
            failures: failure_rx,
        })
    }

    fn fetch_one(
        &self,
        _topic: &str,
        partition: PartitionId,
        offset: LogOffset,
    ) -> BoxFuture<'_, Result<Vec<u8>>> {
        Box::pin(async move {
            let parts = self.partitions.lock().unwrap();
            parts
                .get(partition as usize)
                .and_then(|part| part.get(offset as usize))
                .map(|payload| payload.to_vec())
                .ok_or(BrokerError::NotFound { partition, offset })
        })
    }
}
