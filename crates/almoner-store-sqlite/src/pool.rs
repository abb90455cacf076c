//! A bounded pool of SQLite connections and the transactional scope built on
//! it.
//!
//! Each pooled connection is a [`tokio_rusqlite::Connection`], so SQLite work
//! runs on that connection's own thread and never blocks the async runtime.
//! A handler checks out at most one connection at a time; it goes back to the
//! idle list when the [`PooledConnection`] is dropped.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::{Duration, Instant},
};

use almoner_core::RequestContext;
use parking_lot::Mutex;
use rusqlite::{InterruptHandle, Transaction, TransactionBehavior};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  error::is_busy,
  schema::{CONNECTION_PRAGMAS, SCHEMA},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Pool sizing, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
  /// Upper bound on connections checked out or idle at once.
  pub max_open:     usize,
  /// Connections kept around after being returned.
  pub max_idle:     usize,
  /// Connections older than this are closed instead of reused.
  pub max_lifetime: Option<Duration>,
  /// How long a statement waits on another connection's write lock.
  pub busy_timeout: Duration,
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      max_open:     8,
      max_idle:     4,
      max_lifetime: Some(Duration::from_secs(30 * 60)),
      busy_timeout: Duration::from_secs(5),
    }
  }
}

impl PoolConfig {
  /// A private in-memory database lives and dies with its only connection,
  /// so that connection is never closed or duplicated.
  pub fn in_memory() -> Self {
    Self {
      max_open:     1,
      max_idle:     1,
      max_lifetime: None,
      busy_timeout: Duration::from_secs(5),
    }
  }
}

// ─── Pool ────────────────────────────────────────────────────────────────────

struct Entry {
  conn:      tokio_rusqlite::Connection,
  interrupt: Arc<InterruptHandle>,
  opened_at: Instant,
}

struct Inner {
  target:  Target,
  config:  PoolConfig,
  permits: Arc<Semaphore>,
  idle:    Mutex<Vec<Entry>>,
}

enum Target {
  File(PathBuf),
  Memory,
}

impl Inner {
  fn expired(&self, entry: &Entry) -> bool {
    self
      .config
      .max_lifetime
      .is_some_and(|lifetime| entry.opened_at.elapsed() >= lifetime)
  }
}

/// Connection pool shared by every repository.
///
/// Cloning is cheap; the pool state is reference-counted.
#[derive(Clone)]
pub struct Pool {
  inner: Arc<Inner>,
}

impl Pool {
  /// Open a pool over the database file at `path` and run schema
  /// initialisation.
  pub async fn open(path: impl AsRef<Path>, config: PoolConfig) -> Result<Self> {
    Self::with_target(Target::File(path.as_ref().to_path_buf()), config).await
  }

  /// Open a pool over a private in-memory database. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    Self::with_target(Target::Memory, PoolConfig::in_memory()).await
  }

  async fn with_target(target: Target, config: PoolConfig) -> Result<Self> {
    let permits = Arc::new(Semaphore::new(config.max_open.max(1)));
    let pool = Self {
      inner: Arc::new(Inner { target, config, permits, idle: Mutex::new(Vec::new()) }),
    };

    let ctx = RequestContext::new("schema");
    pool
      .run(&ctx, |conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(pool)
  }

  pub fn config(&self) -> &PoolConfig { &self.inner.config }

  async fn open_entry(&self) -> Result<Entry> {
    let conn = match &self.inner.target {
      Target::File(path) => tokio_rusqlite::Connection::open(path).await?,
      Target::Memory => tokio_rusqlite::Connection::open_in_memory().await?,
    };

    let busy_timeout = self.inner.config.busy_timeout;
    let interrupt = conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(conn.get_interrupt_handle())
      })
      .await?;

    debug!("opened sqlite connection");
    Ok(Entry { conn, interrupt: Arc::new(interrupt), opened_at: Instant::now() })
  }

  fn take_idle(&self) -> Option<Entry> {
    let mut idle = self.inner.idle.lock();
    while let Some(entry) = idle.pop() {
      if !self.inner.expired(&entry) {
        return Some(entry);
      }
    }
    None
  }

  /// Check out a connection, waiting for a free slot unless the request is
  /// cancelled first.
  pub async fn get(&self, ctx: &RequestContext) -> Result<PooledConnection> {
    let permit = tokio::select! {
      permit = self.inner.permits.clone().acquire_owned() => {
        permit.map_err(|_| Error::PoolClosed)?
      }
      () = done(ctx) => {
        ctx.check()?;
        return Err(Error::PoolClosed);
      }
    };

    let entry = match self.take_idle() {
      Some(entry) => entry,
      None => self.open_entry().await?,
    };

    Ok(PooledConnection { entry: Some(entry), inner: self.inner.clone(), _permit: permit })
  }

  /// Run `f` on a pooled connection, outside any explicit transaction.
  pub async fn run<T, F>(&self, ctx: &RequestContext, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.get(ctx).await?.call(ctx, f).await
  }

  /// Run `body` inside a new transaction: commit if it succeeds, roll back
  /// if it fails or the request ends first. No retries.
  ///
  /// SQLite transactions are serializable. The scope opens with
  /// `BEGIN IMMEDIATE`, taking the write lock before the first read, so a
  /// decision made on a value read in `body` holds until commit; concurrent
  /// writers queue for at most the busy timeout, and a queued request gives
  /// up as soon as it is cancelled or outlives its deadline.
  pub async fn transaction<T, F>(&self, ctx: &RequestContext, body: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let scope = ctx.clone();
    let busy_timeout = self.inner.config.busy_timeout;
    self
      .run(ctx, move |conn| {
        scope.check()?;
        let tx = begin_immediate(conn, &scope, busy_timeout)?;

        match body(&tx).and_then(|value| {
          scope.check()?;
          Ok(value)
        }) {
          Ok(value) => {
            tx.commit()?;
            Ok(value)
          }
          Err(err) => {
            if let Err(rollback) = tx.rollback() {
              warn!(span_id = %scope.span_id(), error = %rollback, "rollback failed");
            }
            Err(err)
          }
        }
      })
      .await
  }
}

/// Longest single wait on another connection's write lock before the
/// request is checked again.
const LOCK_SLICE: Duration = Duration::from_millis(50);

/// Take the write lock in [`LOCK_SLICE`] waits. An interrupt does not end a
/// busy wait, so the request's cancellation and deadline are polled here.
fn begin_immediate<'c>(
  conn: &'c rusqlite::Connection,
  scope: &RequestContext,
  busy_timeout: Duration,
) -> Result<Transaction<'c>> {
  conn.busy_timeout(LOCK_SLICE.min(busy_timeout))?;
  let begun = acquire_write_lock(conn, scope, busy_timeout);
  conn.busy_timeout(busy_timeout)?;
  begun
}

fn acquire_write_lock<'c>(
  conn: &'c rusqlite::Connection,
  scope: &RequestContext,
  busy_timeout: Duration,
) -> Result<Transaction<'c>> {
  let started = Instant::now();
  loop {
    match Transaction::new_unchecked(conn, TransactionBehavior::Immediate) {
      Err(e) if is_busy(&e) && started.elapsed() < busy_timeout => {
        scope.check()?;
      }
      begun => return Ok(begun?),
    }
  }
}

/// Resolves once the request is cancelled or its deadline passes.
async fn done(ctx: &RequestContext) {
  match ctx.deadline() {
    Some(deadline) => tokio::select! {
      () = ctx.token().cancelled() => {}
      () = tokio::time::sleep_until(deadline.into()) => {}
    },
    None => ctx.token().cancelled().await,
  }
}

// ─── Checked-out connection ──────────────────────────────────────────────────

/// A connection on loan from the [`Pool`]; returned when dropped.
pub struct PooledConnection {
  entry:   Option<Entry>,
  inner:   Arc<Inner>,
  _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
  /// Run `f` on this connection's thread.
  ///
  /// If the request ends while `f` runs, the running statement is
  /// interrupted and the outcome of `f` is still awaited, so the connection
  /// is idle again when it goes back to the pool.
  pub async fn call<T, F>(&self, ctx: &RequestContext, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let Some(entry) = self.entry.as_ref() else {
      return Err(Error::PoolClosed);
    };

    let work = entry.conn.call(move |conn| Ok(f(conn)));
    tokio::pin!(work);

    let outcome = tokio::select! {
      outcome = &mut work => outcome,
      () = done(ctx) => {
        ctx.cancel();
        entry.interrupt.interrupt();
        work.await
      }
    };
    outcome?
  }
}

impl Drop for PooledConnection {
  fn drop(&mut self) {
    let Some(entry) = self.entry.take() else { return };
    if self.inner.expired(&entry) {
      debug!("closing expired sqlite connection");
      return;
    }
    let mut idle = self.inner.idle.lock();
    if idle.len() < self.inner.config.max_idle {
      idle.push(entry);
    }
  }
}
