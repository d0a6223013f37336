//! Host-keyed pool of reusable transport handles.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::transport::{Connector, TransportError};

/// Bounds applied by a [`ConnectionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
    /// Open connections (idle or in use) across all hosts.
    pub max_connections: usize,
    /// Idle connections older than this are discarded.
    pub idle_ttl: Duration,
}

impl PoolSettings {
    /// Reads pool bounds from a client config.
    #[must_use]
    pub const fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_idle_per_host: config.max_connections_per_host,
            max_connections: config.max_connections,
            idle_ttl: config.connection_idle_ttl,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Connections parked in host buckets.
    pub idle: usize,
    /// Connections open in total (idle plus checked out).
    pub open: usize,
}

/// A connection checked out of the pool.
///
/// Holding a `PooledConnection` is what "in use" means: the pool has no other
/// reference to it until it is handed back through
/// [`ConnectionPool::release`] or [`ConnectionPool::evict`]. Dropping it
/// without either closes it and frees its slot.
pub struct PooledConnection<T> {
    id: u64,
    host: String,
    transport: T,
    last_used: Instant,
    reused: bool,
    _slot: OwnedSemaphorePermit,
}

impl<T> PooledConnection<T> {
    /// Pool-unique identifier of this connection.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Host key this connection belongs to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The underlying transport handle.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// When the connection was last handed out or returned.
    #[must_use]
    pub const fn last_used(&self) -> Instant {
        self.last_used
    }

    /// Whether this connection came from an idle bucket rather than a fresh
    /// connect.
    #[must_use]
    pub const fn is_reused(&self) -> bool {
        self.reused
    }
}

impl<T> fmt::Debug for PooledConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("reused", &self.reused)
            .finish_non_exhaustive()
    }
}

type Buckets<T> = HashMap<String, VecDeque<PooledConnection<T>>>;

/// Pool of transport handles keyed by `scheme://host:port`.
///
/// # Limits
///
/// Every open connection, idle or checked out, holds one slot of a global
/// semaphore sized `max_connections`, so the cap cannot be exceeded. When all
/// slots are taken, `acquire` closes an idle connection belonging to another
/// host; if there is none it waits until a connection is released, evicted
/// or dropped.
///
/// # Locking
///
/// The bucket map sits behind a `std::sync::Mutex` that is only held for
/// short, synchronous bookkeeping and never across an await point.
pub struct ConnectionPool<C: Connector> {
    connector: C,
    settings: PoolSettings,
    slots: Arc<Semaphore>,
    buckets: Mutex<Buckets<C::Transport>>,
    returned: Notify,
    next_id: AtomicU64,
}

impl<C: Connector> ConnectionPool<C> {
    /// Creates an empty pool.
    ///
    /// A `max_connections` of zero is treated as one so `acquire` can make
    /// progress.
    pub fn new(connector: C, settings: PoolSettings) -> Self {
        let cap = settings.max_connections.max(1);
        Self {
            connector,
            settings,
            slots: Arc::new(Semaphore::new(cap)),
            buckets: Mutex::new(HashMap::new()),
            returned: Notify::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the pool bounds.
    pub const fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Returns the connector used to open new connections.
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Checks out a connection for `host`.
    ///
    /// Prefers the most recently returned idle connection for the host,
    /// discarding any that outlived the idle TTL. Otherwise opens a new one
    /// through the connector once a slot is free.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the connector fails to open a handle.
    /// The reserved slot is freed in that case.
    pub async fn acquire(
        &self,
        host: &str,
    ) -> Result<PooledConnection<C::Transport>, TransportError> {
        loop {
            let returned = self.returned.notified();
            tokio::pin!(returned);
            returned.as_mut().enable();

            if let Some(conn) = self.take_idle(host) {
                tracing::trace!("Reusing connection #{} for {}", conn.id, host);
                return Ok(conn);
            }

            if let Ok(slot) = Arc::clone(&self.slots).try_acquire_owned() {
                return self.open(host, slot).await;
            }

            if self.close_idle_elsewhere(host) {
                continue;
            }

            tracing::debug!(
                "Connection pool full ({} open), waiting for a free slot",
                self.settings.max_connections
            );
            tokio::select! {
                () = &mut returned => {}
                slot = Arc::clone(&self.slots).acquire_owned() => {
                    let slot = slot.map_err(|_| {
                        TransportError::Configuration("connection pool is closed".to_string())
                    })?;
                    // An idle connection for this host may have appeared meanwhile.
                    if let Some(conn) = self.take_idle(host) {
                        drop(slot);
                        return Ok(conn);
                    }
                    return self.open(host, slot).await;
                }
            }
        }
    }

    /// Returns a healthy connection to its host bucket.
    ///
    /// If the bucket already holds `max_idle_per_host` connections the
    /// connection is closed instead.
    pub fn release(&self, mut conn: PooledConnection<C::Transport>) {
        conn.last_used = Instant::now();
        conn.reused = true;
        {
            let mut buckets = self.lock();
            let bucket = buckets.entry(conn.host.clone()).or_default();
            self.discard_stale(bucket);
            if bucket.len() < self.settings.max_idle_per_host {
                bucket.push_back(conn);
            } else {
                tracing::trace!(
                    "Idle bucket for {} full, closing connection #{}",
                    conn.host,
                    conn.id
                );
                drop(conn);
            }
        }
        self.returned.notify_waiters();
    }

    /// Closes a connection that failed during use. It is never reused.
    pub fn evict(&self, conn: PooledConnection<C::Transport>) {
        tracing::debug!("Evicting connection #{} for {}", conn.id, conn.host);
        drop(conn);
        self.returned.notify_waiters();
    }

    /// Returns current occupancy.
    pub fn stats(&self) -> PoolStats {
        let idle = self.lock().values().map(VecDeque::len).sum();
        let cap = self.settings.max_connections.max(1);
        PoolStats {
            idle,
            open: cap - self.slots.available_permits(),
        }
    }

    async fn open(
        &self,
        host: &str,
        slot: OwnedSemaphorePermit,
    ) -> Result<PooledConnection<C::Transport>, TransportError> {
        // On error the slot is dropped here, which frees it.
        let transport = self.connector.connect(host).await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Opened connection #{} for {}", id, host);
        Ok(PooledConnection {
            id,
            host: host.to_string(),
            transport,
            last_used: Instant::now(),
            reused: false,
            _slot: slot,
        })
    }

    fn take_idle(&self, host: &str) -> Option<PooledConnection<C::Transport>> {
        let mut buckets = self.lock();
        let bucket = buckets.get_mut(host)?;
        self.discard_stale(bucket);
        let mut conn = bucket.pop_back()?;
        conn.last_used = Instant::now();
        Some(conn)
    }

    /// Closes the least recently used idle connection of some other host.
    /// Returns false if there was none.
    fn close_idle_elsewhere(&self, host: &str) -> bool {
        let mut buckets = self.lock();
        let victim = buckets
            .iter_mut()
            .filter(|(key, bucket)| key.as_str() != host && !bucket.is_empty())
            .min_by_key(|(_, bucket)| bucket.front().map(|c| c.last_used))
            .and_then(|(_, bucket)| bucket.pop_front());

        match victim {
            Some(conn) => {
                tracing::debug!("Reclaiming idle connection #{} from {}", conn.id, conn.host);
                true
            }
            None => false,
        }
    }

    fn discard_stale(&self, bucket: &mut VecDeque<PooledConnection<C::Transport>>) {
        let ttl = self.settings.idle_ttl;
        bucket.retain(|conn| {
            let fresh = conn.last_used.elapsed() <= ttl;
            if !fresh {
                tracing::trace!("Discarding stale connection #{} for {}", conn.id, conn.host);
            }
            fresh
        });
    }

    fn lock(&self) -> MutexGuard<'_, Buckets<C::Transport>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Connector> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("settings", &self.settings)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
