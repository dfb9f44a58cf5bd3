//! Concurrent breadth-first traversal of the namespace tree.
//!
//! A fixed pool of worker tasks drains a growing queue of namespace
//! paths. Each visit lists the namespace's auth methods, secrets engines,
//! and child namespaces; children feed back into the queue. The walk is
//! done when the queue is empty and no visit is still in flight - queue
//! emptiness alone is not enough, because a worker may be about to
//! enqueue children it just discovered.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::{normalize_namespace_path, AuditOptions};
use crate::vault_api::{MountMap, NamespaceSource, VaultError};

use super::types::{AuditData, AuditOutcome, AuditStats};

const QUEUE_STALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Work queue shared by the worker pool.
///
/// `in_flight` counts paths that have been enqueued but whose visit has
/// not finished. It is incremented before the push and decremented after
/// the visit returns, so `in_flight == 0` with an empty queue means the
/// frontier is exhausted.
struct WorkQueue {
    items: Mutex<VecDeque<String>>,
    in_flight: AtomicUsize,
    notify: Notify,
    shutdown: AtomicBool,
}

impl WorkQueue {
    fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            in_flight: AtomicUsize::new(0),
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    fn push(&self, path: String) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.items.lock().unwrap().push_back(path);
        self.notify.notify_waiters();
    }

    /// Take the next path, or `None` once the frontier is exhausted or
    /// shutdown was requested.
    async fn pop(&self) -> Option<String> {
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return None;
            }

            // Register for wakeups before checking state, otherwise a
            // push landing between the check and the await is lost.
            // `notify_waiters` only reaches futures that are already
            // registered, hence the explicit `enable`.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(path) = self.items.lock().unwrap().pop_front() {
                return Some(path);
            }
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                self.notify.notify_waiters();
                return None;
            }

            if timeout(QUEUE_STALL_TIMEOUT, notified).await.is_err() {
                warn!(
                    seconds = QUEUE_STALL_TIMEOUT.as_secs(),
                    "no work arrived within the stall timeout, retrying"
                );
            }
        }
    }

    fn visit_done(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }

    fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn drained(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }
}

/// Releases the in-flight slot for a popped path even if the visit
/// panics, so a failing worker cannot strand the pool.
struct InFlightGuard<'a>(&'a WorkQueue);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.visit_done();
    }
}

/// Requests a clean stop: workers finish the item in hand and take no
/// new work.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<WorkQueue>);

impl ShutdownHandle {
    pub fn request(&self) {
        self.0.request_shutdown();
    }
}

#[derive(Default)]
struct StatsInner {
    processed_count: usize,
    error_count: usize,
}

/// Breadth-first namespace auditor over any [`NamespaceSource`].
pub struct NamespaceAuditor<S> {
    source: Arc<S>,
    options: AuditOptions,
    queue: Arc<WorkQueue>,
}

impl<S: NamespaceSource + 'static> NamespaceAuditor<S> {
    pub fn new(source: Arc<S>, options: AuditOptions) -> Self {
        Self {
            source,
            options,
            queue: Arc::new(WorkQueue::new()),
        }
    }

    /// Handle for interrupt wiring; valid for the lifetime of the audit.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.queue))
    }

    /// Walk the tree reachable from `start_path` and collect the audit
    /// result.
    ///
    /// Per-path failures are counted and logged without failing the run.
    /// Returns [`VaultError::Interrupted`] when shutdown was requested
    /// before the frontier drained; no partial result is returned in
    /// that case.
    pub async fn audit(self, start_path: &str) -> Result<AuditOutcome, VaultError> {
        let started = Instant::now();
        let start_path = normalize_namespace_path(start_path);

        let data = Arc::new(Mutex::new(AuditData::default()));
        let stats = Arc::new(Mutex::new(StatsInner::default()));

        self.queue.push(start_path);

        let mut handles = Vec::with_capacity(self.options.worker_threads);
        for worker_id in 0..self.options.worker_threads {
            let worker = Worker {
                id: worker_id + 1,
                queue: Arc::clone(&self.queue),
                source: Arc::clone(&self.source),
                data: Arc::clone(&data),
                stats: Arc::clone(&stats),
                options: self.options.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }
        info!(workers = self.options.worker_threads, "started worker tasks");

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task aborted");
                stats.lock().unwrap().error_count += 1;
            }
        }

        if self.queue.shutdown.load(Ordering::SeqCst) && !self.queue.drained() {
            let pending = self.queue.items.lock().unwrap().len();
            warn!(pending, "audit interrupted before the queue drained");
            return Err(VaultError::Interrupted);
        }

        let data = data.lock().unwrap().clone();
        let counters = stats.lock().unwrap();
        Ok(AuditOutcome {
            data,
            stats: AuditStats {
                processed_count: counters.processed_count,
                error_count: counters.error_count,
                duration: started.elapsed(),
            },
        })
    }
}

struct Worker<S> {
    id: usize,
    queue: Arc<WorkQueue>,
    source: Arc<S>,
    data: Arc<Mutex<AuditData>>,
    stats: Arc<Mutex<StatsInner>>,
    options: AuditOptions,
}

impl<S: NamespaceSource> Worker<S> {
    async fn run(self) {
        while let Some(path) = self.queue.pop().await {
            let _guard = InFlightGuard(&self.queue);
            self.visit_namespace(&path).await;
        }
        debug!(worker = self.id, "worker exiting");
    }

    /// Visit a single namespace: list its mounts, store what succeeded,
    /// and enqueue any children.
    async fn visit_namespace(&self, namespace_path: &str) {
        let display_path = if namespace_path.is_empty() {
            "root"
        } else {
            namespace_path
        };
        info!(namespace = display_path, "processing namespace");

        // The counter is bumped under the lock so exactly one worker
        // observes each batch boundary and serves the sleep.
        let processed = {
            let mut stats = self.stats.lock().unwrap();
            stats.processed_count += 1;
            stats.processed_count
        };
        if !self.options.rate_limit_disable && processed % self.options.rate_limit_batch_size == 0 {
            info!(
                seconds = self.options.rate_limit_sleep.as_secs(),
                "rate limiting"
            );
            sleep(self.options.rate_limit_sleep).await;
        }

        let canonical = namespace_path.trim_end_matches('/').to_string();
        let mut path_failed = false;

        let auth_methods =
            self.list_or_flag(self.source.list_auth_methods(namespace_path).await, display_path, "auth methods", &mut path_failed);
        let secret_engines =
            self.list_or_flag(self.source.list_secrets_engines(namespace_path).await, display_path, "secrets engines", &mut path_failed);

        {
            let mut data = self.data.lock().unwrap();
            if let Some(mounts) = auth_methods {
                data.auth_methods.insert(canonical.clone(), mounts);
            }
            if let Some(mounts) = secret_engines {
                data.secret_engines.insert(canonical.clone(), mounts);
            }
        }

        // Children may still be listable when the mount listings were
        // denied, so this call is always attempted.
        match self.source.list_namespaces(namespace_path).await {
            Ok(listing) => {
                for name in &listing.keys {
                    let child_path = format!("{namespace_path}{name}");
                    debug!(child = %child_path, "discovered child namespace");
                    self.queue.push(child_path.clone());
                    let info = listing.key_info.get(name).cloned().unwrap_or_default();
                    let mut data = self.data.lock().unwrap();
                    data.namespaces
                        .entry(child_path.trim_end_matches('/').to_string())
                        .or_insert(info);
                }
            }
            Err(VaultError::NotFound { .. }) => {
                debug!(namespace = display_path, "no child namespaces");
            }
            Err(e) => {
                warn!(namespace = display_path, error = %e, "child namespace listing failed");
                path_failed = true;
            }
        }

        if path_failed {
            self.stats.lock().unwrap().error_count += 1;
        }
    }

    /// Map a mount listing result to its stored form: not-found means an
    /// empty table, permission or API failures flag the path and store
    /// nothing.
    fn list_or_flag(
        &self,
        result: Result<MountMap, VaultError>,
        display_path: &str,
        what: &str,
        path_failed: &mut bool,
    ) -> Option<MountMap> {
        match result {
            Ok(mounts) => Some(mounts),
            Err(VaultError::NotFound { .. }) => Some(MountMap::new()),
            Err(VaultError::Permission { .. }) => {
                warn!(namespace = display_path, "permission denied listing {what}");
                *path_failed = true;
                None
            }
            Err(e) => {
                warn!(namespace = display_path, error = %e, "failed to list {what}");
                *path_failed = true;
                None
            }
        }
    }
}
