//! Fan-in engine: merge N independently-paced sources into one stream.
//!
//! [`ComposedReader`] owns one OS thread per upstream reader. Each thread
//! pulls a record, runs it through the shared transform chain (under the
//! configured per-position guards), and appends survivors to a shared queue.
//! The consumer blocks in [`ComposedReader::read`] until a record is queued
//! or every source has exhausted.
//!
//! Ordering: FIFO within each source's stream; no cross-source order.
//!
//! A source thread can only end by marking itself exhausted: read errors,
//! transform errors, and panics all fold into exhaustion after logging, so a
//! dead source can never strand the consumer waiting on a liveness flag that
//! will never clear.

use crate::contracts::{Reader, Transform};
use crate::error::ConfigError;
use crate::format::Format;
use crate::record::Record;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

/// How long the consumer sleeps between liveness re-checks while the queue
/// is empty. Short enough that a stop flag is observed promptly.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which transform-chain positions serialize cross-source invocation.
///
/// `All` shares one mutex across every position; `PerTransform` gives each
/// flagged position its own mutex. A guard is required exactly when a
/// transform accumulates cross-call state that multiple sources share.
#[derive(Debug, Clone, Default)]
pub enum LockPolicy {
    /// No position is guarded.
    #[default]
    Unguarded,
    /// Every position serializes on one shared mutex.
    All,
    /// `true` at position i guards transform i.
    PerTransform(Vec<bool>),
}

impl LockPolicy {
    /// Resolve the policy into one optional guard per chain position.
    fn resolve(self, transforms: usize) -> Result<Vec<Option<Arc<Mutex<()>>>>, ConfigError> {
        match self {
            LockPolicy::Unguarded => Ok(vec![None; transforms]),
            LockPolicy::All => {
                let shared = Arc::new(Mutex::new(()));
                Ok((0..transforms).map(|_| Some(shared.clone())).collect())
            }
            LockPolicy::PerTransform(flags) => {
                if flags.len() != transforms {
                    return Err(ConfigError::LockPolicyLength {
                        got: flags.len(),
                        expected: transforms,
                    });
                }
                Ok(flags
                    .into_iter()
                    .map(|guarded| guarded.then(|| Arc::new(Mutex::new(()))))
                    .collect())
            }
        }
    }
}

/// State shared between source threads and the consumer.
#[derive(Debug)]
struct Shared {
    queue: Mutex<VecDeque<Record>>,
    available: Condvar,
    /// Count of sources that have not yet exhausted.
    live: AtomicUsize,
    stop: AtomicBool,
}

/// Merges records from many readers through one transform chain into a
/// single blocking [`read`](ComposedReader::read).
#[derive(Debug)]
pub struct ComposedReader {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
    output_format: Format,
}

impl ComposedReader {
    /// Build the engine and start one thread per reader.
    ///
    /// Validation happens before any thread is spawned: a per-position lock
    /// list must match the chain length, and with `check_formats` every
    /// reader's chain must type-check stage to stage. Either failure is a
    /// [`ConfigError`] and the engine never starts.
    pub fn new(
        readers: Vec<Box<dyn Reader>>,
        transforms: Vec<Arc<dyn Transform>>,
        lock_policy: LockPolicy,
        check_formats: bool,
    ) -> Result<Self, ConfigError> {
        let guards = lock_policy.resolve(transforms.len())?;

        let output_format = if check_formats {
            verify_chain(&readers, &transforms)?
        } else {
            Format::Unknown
        };

        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            live: AtomicUsize::new(readers.len()),
            stop: AtomicBool::new(false),
        });

        let handles = readers
            .into_iter()
            .enumerate()
            .map(|(index, reader)| {
                let shared = shared.clone();
                let transforms = transforms.clone();
                let guards = guards.clone();
                thread::Builder::new()
                    .name(format!("seine-source-{index}"))
                    .spawn(move || run_source(index, reader, &transforms, &guards, &shared))
                    .expect("spawn source thread")
            })
            .collect();

        Ok(Self {
            shared,
            handles,
            output_format,
        })
    }

    /// Number of sources still running.
    pub fn live_sources(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Ask source threads to exit after their current read returns.
    ///
    /// A source blocked inside its own `read` (a tailing file, a quiet
    /// socket) does not see this flag; interrupt such readers through
    /// their own stop handles before joining.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
    }

    /// Join all source threads. Call after the stream has drained (or after
    /// [`stop`](Self::stop)); joining mid-stream blocks until sources end.
    pub fn join(&mut self) {
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("source thread panicked outside its guarded loop");
            }
        }
    }
}

impl Reader for ComposedReader {
    /// Pop the oldest queued record, blocking until one arrives. Once every
    /// source has exhausted and the queue is empty this returns `Ok(None)`,
    /// and keeps returning it.
    fn read(&mut self) -> anyhow::Result<Option<Record>> {
        // A panicking source thread may poison the queue mutex mid-push;
        // the queue itself is still consistent, so recover the guard.
        let mut queue = self
            .shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(record) = queue.pop_front() {
                return Ok(Some(record));
            }
            if self.shared.live.load(Ordering::SeqCst) == 0 {
                return Ok(None);
            }
            // Bounded wait rather than an open-ended one: liveness flags
            // and the stop flag get re-checked even if a wakeup is missed.
            let (guard, _) = self
                .shared
                .available
                .wait_timeout(queue, POLL_INTERVAL)
                .unwrap_or_else(PoisonError::into_inner);
            queue = guard;
        }
    }

    fn output_format(&self) -> Format {
        self.output_format
    }

    fn name(&self) -> &str {
        "composed"
    }
}

impl Drop for ComposedReader {
    fn drop(&mut self) {
        self.stop();
        // Threads blocked inside an upstream read finish on their own time;
        // they hold only cloned Arcs, so dropping the engine is safe without
        // joining.
    }
}

/// Verify `reader → transform₁ → … → transformₙ` for every reader and fold
/// the per-reader results into the engine's output format.
fn verify_chain(
    readers: &[Box<dyn Reader>],
    transforms: &[Arc<dyn Transform>],
) -> Result<Format, ConfigError> {
    let mut merged: Option<Format> = None;
    for reader in readers {
        let mut tag = reader.output_format();
        let mut upstream = reader.name().to_string();
        for transform in transforms {
            if !transform.input_format().can_accept(tag) {
                return Err(ConfigError::FormatMismatch {
                    producer: upstream,
                    produces: tag,
                    consumer: transform.name().to_string(),
                    expects: transform.input_format(),
                });
            }
            tag = transform.output_format();
            upstream = transform.name().to_string();
        }
        merged = Some(match merged {
            None => tag,
            Some(prev) => Format::common(prev, tag)
                .ok_or(ConfigError::IncompatibleSources(prev, tag))?,
        });
    }
    Ok(merged.unwrap_or(Format::Unknown))
}

/// Per-source thread body: pull, transform, enqueue, until exhaustion.
fn run_source(
    index: usize,
    mut reader: Box<dyn Reader>,
    transforms: &[Arc<dyn Transform>],
    guards: &[Option<Arc<Mutex<()>>>],
    shared: &Shared,
) {
    loop {
        if shared.stop.load(Ordering::SeqCst) {
            debug!(source = index, "stop requested");
            break;
        }

        let record = match catch_unwind(AssertUnwindSafe(|| reader.read())) {
            Err(_) => {
                error!(source = index, "reader panicked; marking source exhausted");
                break;
            }
            Ok(Err(e)) => {
                error!(source = index, error = %e, "read failed; marking source exhausted");
                break;
            }
            Ok(Ok(None)) => {
                debug!(source = index, "source exhausted");
                break;
            }
            Ok(Ok(Some(record))) => record,
        };

        match catch_unwind(AssertUnwindSafe(|| {
            apply_chain(record, transforms, guards)
        })) {
            Err(_) => {
                error!(source = index, "transform panicked; marking source exhausted");
                break;
            }
            Ok(Err(e)) => {
                error!(source = index, error = %e, "transform failed; marking source exhausted");
                break;
            }
            // A transform dropped the record; nothing reaches the queue.
            Ok(Ok(None)) => continue,
            Ok(Ok(Some(record))) => {
                let mut queue = shared
                    .queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                queue.push_back(record);
                shared.available.notify_one();
            }
        }
    }

    shared.live.fetch_sub(1, Ordering::SeqCst);
    // Wake the consumer so it can observe the cleared liveness count.
    shared.available.notify_all();
}

/// Run one record through the chain, short-circuiting on the first drop.
fn apply_chain(
    mut record: Record,
    transforms: &[Arc<dyn Transform>],
    guards: &[Option<Arc<Mutex<()>>>],
) -> anyhow::Result<Option<Record>> {
    for (transform, guard) in transforms.iter().zip(guards) {
        let next = match guard {
            Some(mutex) => {
                // A panic in another source's guarded call poisons this
                // mutex. The guard protects no data, so recover it; only
                // the panicking source is exhausted.
                let _held = mutex.lock().unwrap_or_else(PoisonError::into_inner);
                transform.transform(record)?
            }
            None => transform.transform(record)?,
        };
        match next {
            Some(output) => record = output,
            None => return Ok(None),
        }
    }
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unguarded_policy_resolves_to_no_guards() {
        let guards = LockPolicy::Unguarded.resolve(3).unwrap();
        assert_eq!(guards.len(), 3);
        assert!(guards.iter().all(|g| g.is_none()));
    }

    #[test]
    fn all_policy_shares_one_mutex() {
        let guards = LockPolicy::All.resolve(3).unwrap();
        let first = guards[0].as_ref().unwrap();
        assert!(guards[1..]
            .iter()
            .all(|g| Arc::ptr_eq(first, g.as_ref().unwrap())));
    }

    #[test]
    fn per_transform_policy_guards_flagged_positions() {
        let guards = LockPolicy::PerTransform(vec![false, true, false])
            .resolve(3)
            .unwrap();
        assert!(guards[0].is_none());
        assert!(guards[1].is_some());
        assert!(guards[2].is_none());
    }

    #[test]
    fn mismatched_lock_list_is_a_config_error() {
        let err = LockPolicy::PerTransform(vec![true]).resolve(2).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LockPolicyLength { got: 1, expected: 2 }
        ));
    }
}
