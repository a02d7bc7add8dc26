//! Channel plus worker pool feeding one stream

use crossbeam_channel::{bounded, Receiver, Sender};
use oxidelog_core::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use crate::stream::Stream;

/// Fixed pool of worker threads draining one channel into one stream.
///
/// With a single worker lines reach the file in submission order. With more
/// workers lines may be written out of order; nothing is lost either way.
pub struct Dispatcher {
    name: String,
    tx: Sender<String>,
    workers: Vec<JoinHandle<()>>,
    /// Lines dropped because the stream write failed
    failed: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Spawn `workers` threads reading from a channel of `capacity` slots.
    /// A capacity of 0 makes every submit wait for a worker to receive.
    pub fn spawn(name: &str, stream: Arc<Stream>, workers: usize, capacity: usize) -> Result<Self> {
        let (tx, rx) = bounded::<String>(capacity);
        let failed = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx = rx.clone();
            let stream = Arc::clone(&stream);
            let failed = Arc::clone(&failed);
            let handle = thread::Builder::new()
                .name(format!("oxidelog-{}-{}", name, i))
                .spawn(move || worker_loop(rx, stream, failed))?;
            handles.push(handle);
        }

        debug!("Dispatcher '{}' started with {} workers", name, workers);

        Ok(Self {
            name: name.to_string(),
            tx,
            workers: handles,
            failed,
        })
    }

    /// Hand a finished line to the workers. Blocks only while the channel
    /// is full. Returns false if every worker is gone.
    pub fn submit(&self, line: String) -> bool {
        self.tx.send(line).is_ok()
    }

    /// Lines queued and not yet picked up by a worker
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    /// Lines dropped so far because writing them failed
    pub fn failed_writes(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Close the channel and wait until the workers have drained it
    pub fn shutdown(self) {
        let Dispatcher { name, tx, workers, failed } = self;
        drop(tx);

        for handle in workers {
            if handle.join().is_err() {
                error!("Dispatcher '{}' worker panicked", name);
            }
        }
        debug!(
            "Dispatcher '{}' drained ({} failed writes)",
            name,
            failed.load(Ordering::Relaxed)
        );
    }
}

fn worker_loop(rx: Receiver<String>, stream: Arc<Stream>, failed: Arc<AtomicU64>) {
    // Ends once every sender is dropped and the queue is empty
    for line in rx.iter() {
        if let Err(e) = stream.write(&line) {
            failed.fetch_add(1, Ordering::Relaxed);
            error!("Unable to log message [{}]: {}", line.trim_end(), e);
        }
    }
}
