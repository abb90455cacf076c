//! [`SqliteStore`]: the SQLite implementation of [`Repositories`].

use std::path::Path;

use almoner_core::repository::Repositories;
use tracing::info;

use crate::{
  Result,
  donations::SqliteDonations,
  families::SqliteFamilies,
  persons::SqlitePersons,
  pool::{Pool, PoolConfig},
  resources::SqliteResources,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The Almoner store backed by a single SQLite file.
///
/// Cloning is cheap; every clone and every repository handle shares one
/// connection pool.
#[derive(Clone)]
pub struct SqliteStore {
  pool: Pool,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, config: PoolConfig) -> Result<Self> {
    let path = path.as_ref();
    let pool = Pool::open(path, config).await?;
    info!(
      path = %path.display(),
      max_open = pool.config().max_open,
      max_idle = pool.config().max_idle,
      "sqlite store ready"
    );
    Ok(Self { pool })
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    Ok(Self { pool: Pool::open_in_memory().await? })
  }
}

impl Repositories for SqliteStore {
  type Donations = SqliteDonations;
  type Families = SqliteFamilies;
  type Persons = SqlitePersons;
  type Resources = SqliteResources;

  fn resources(&self) -> SqliteResources { SqliteResources::new(self.pool.clone()) }

  fn families(&self) -> SqliteFamilies { SqliteFamilies::new(self.pool.clone()) }

  fn persons(&self) -> SqlitePersons { SqlitePersons::new(self.pool.clone()) }

  fn donations(&self) -> SqliteDonations { SqliteDonations::new(self.pool.clone()) }
}
