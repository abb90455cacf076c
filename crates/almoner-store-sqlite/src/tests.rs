//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::time::Duration;

use almoner_core::{
  Change, Error, RequestContext,
  donation::NewDonation,
  family::{FamilyUpdate, NewFamily},
  person::{NewPerson, PersonUpdate},
  repository::{
    DonationRepository, FamilyRepository, PersonRepository, Repositories,
    ResourceRepository,
  },
  resource::{NewResource, ResourceUpdate},
};

use crate::{PoolConfig, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ctx() -> RequestContext { RequestContext::new("/test") }

fn rice(quantity: f64) -> NewResource {
  NewResource {
    name: "Rice".into(),
    amount: 1.0,
    measurement: "Kg".into(),
    quantity,
  }
}

fn silva() -> NewFamily {
  NewFamily {
    name:         "Silva".into(),
    country:      "Brazil".into(),
    state:        "SP".into(),
    city:         "Campinas".into(),
    neighborhood: "Centro".into(),
    street:       "Rua A".into(),
    number:       "10".into(),
    complement:   "apt 2".into(),
    zipcode:      "13000-000".into(),
  }
}

// ─── Resources ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_resource() {
  let s = store().await;
  let ctx = ctx();

  let created = s.resources().create(&ctx, rice(5.0)).await.unwrap();
  assert!(created.id > 0);
  assert_eq!(created.quantity, 5.0);
  assert_eq!(created.deleted_at, None);

  let fetched = s.resources().find_one_by_id(&ctx, created.id).await.unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn ids_are_assigned_in_order() {
  let s = store().await;
  let ctx = ctx();

  let a = s.resources().create(&ctx, rice(1.0)).await.unwrap();
  let b = s.resources().create(&ctx, rice(2.0)).await.unwrap();
  assert!(b.id > a.id);
}

#[tokio::test]
async fn deleted_resource_is_hidden() {
  let s = store().await;
  let ctx = ctx();
  let kept = s.resources().create(&ctx, rice(1.0)).await.unwrap();
  let gone = s.resources().create(&ctx, rice(2.0)).await.unwrap();

  s.resources().delete(&ctx, gone.id).await.unwrap();

  let err = s.resources().find_one_by_id(&ctx, gone.id).await.unwrap_err();
  assert_eq!(err.to_string(), format!("resource {} not found", gone.id));

  let all = s.resources().find_all(&ctx).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].id, kept.id);
}

#[tokio::test]
async fn delete_is_idempotent() {
  let s = store().await;
  let ctx = ctx();
  let r = s.resources().create(&ctx, rice(1.0)).await.unwrap();

  s.resources().delete(&ctx, r.id).await.unwrap();
  s.resources().delete(&ctx, r.id).await.unwrap();
  s.resources().delete(&ctx, 4242).await.unwrap();
}

#[tokio::test]
async fn empty_update_is_rejected_without_touching_the_row() {
  let s = store().await;
  let ctx = ctx();
  let r = s.resources().create(&ctx, rice(3.0)).await.unwrap();

  let err = s
    .resources()
    .update(&ctx, r.id, ResourceUpdate::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmptyModel(ref m) if m == "empty resource model"));

  let after = s.resources().find_one_by_id(&ctx, r.id).await.unwrap();
  assert_eq!(after, r);
}

#[tokio::test]
async fn zero_amount_is_written() {
  let s = store().await;
  let ctx = ctx();
  let r = s.resources().create(&ctx, rice(3.0)).await.unwrap();

  let update = ResourceUpdate { amount: Change::Set(0.0), ..Default::default() };
  let updated = s.resources().update(&ctx, r.id, update).await.unwrap();
  assert_eq!(updated.amount, 0.0);
  assert_eq!(updated.name, "Rice");
  assert!(updated.updated_at >= r.updated_at);
}

#[tokio::test]
async fn update_of_deleted_resource_is_not_found() {
  let s = store().await;
  let ctx = ctx();
  let r = s.resources().create(&ctx, rice(3.0)).await.unwrap();
  s.resources().delete(&ctx, r.id).await.unwrap();

  let update = ResourceUpdate { name: Change::Set("Beans".into()), ..Default::default() };
  let err = s.resources().update(&ctx, r.id, update).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn set_quantity_overrides_stock() {
  let s = store().await;
  let ctx = ctx();
  let r = s.resources().create(&ctx, rice(3.0)).await.unwrap();

  let updated = s.resources().set_quantity(&ctx, r.id, 0.0).await.unwrap();
  assert_eq!(updated.quantity, 0.0);

  let err = s.resources().set_quantity(&ctx, r.id, -1.0).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let err = s.resources().set_quantity(&ctx, 999, 1.0).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(ref m) if m == "resource 999 not found"));
}

// ─── Families and persons ────────────────────────────────────────────────────

#[tokio::test]
async fn family_update_returns_stored_row() {
  let s = store().await;
  let ctx = ctx();
  let f = s.families().create(&ctx, silva()).await.unwrap();

  let update = FamilyUpdate {
    city: Change::Set("Santos".into()),
    ..Default::default()
  };
  let updated = s.families().update(&ctx, f.id, update).await.unwrap();
  assert_eq!(updated.city, "Santos");
  assert_eq!(updated.street, f.street);

  let fetched = s.families().find_one_by_id(&ctx, f.id).await.unwrap();
  assert_eq!(fetched, updated);
}

#[tokio::test]
async fn empty_family_update_is_rejected() {
  let s = store().await;
  let ctx = ctx();
  let f = s.families().create(&ctx, silva()).await.unwrap();

  let err = s
    .families()
    .update(&ctx, f.id, FamilyUpdate::default())
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "empty family model");
}

#[tokio::test]
async fn person_requires_live_family() {
  let s = store().await;
  let ctx = ctx();

  let err = s
    .persons()
    .create(&ctx, NewPerson { family_id: 99, name: "Ana".into() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(ref m) if m == "family 99 not found"));

  let f = s.families().create(&ctx, silva()).await.unwrap();
  s.families().delete(&ctx, f.id).await.unwrap();
  let err = s
    .persons()
    .create(&ctx, NewPerson { family_id: f.id, name: "Ana".into() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));

  assert!(s.persons().find_all(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn person_can_move_between_live_families() {
  let s = store().await;
  let ctx = ctx();
  let first = s.families().create(&ctx, silva()).await.unwrap();
  let second = s.families().create(&ctx, silva()).await.unwrap();
  let p = s
    .persons()
    .create(&ctx, NewPerson { family_id: first.id, name: "Ana".into() })
    .await
    .unwrap();

  let moved = s
    .persons()
    .update(&ctx, p.id, PersonUpdate {
      family_id: Change::Set(second.id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(moved.family_id, second.id);
  assert_eq!(moved.name, "Ana");

  let err = s
    .persons()
    .update(&ctx, p.id, PersonUpdate {
      family_id: Change::Set(77),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(ref m) if m == "family 77 not found"));

  let unchanged = s.persons().find_one_by_id(&ctx, p.id).await.unwrap();
  assert_eq!(unchanged.family_id, second.id);
}

// ─── Donations ───────────────────────────────────────────────────────────────

async fn stocked(s: &SqliteStore, quantity: f64) -> (i64, i64) {
  let ctx = ctx();
  let r = s.resources().create(&ctx, rice(quantity)).await.unwrap();
  let f = s.families().create(&ctx, silva()).await.unwrap();
  (r.id, f.id)
}

fn donation(resource_id: i64, family_id: i64, quantity: f64) -> NewDonation {
  NewDonation { resource_id, family_id, quantity }
}

#[tokio::test]
async fn donating_the_whole_stock_succeeds() {
  let s = store().await;
  let ctx = ctx();
  let (r, f) = stocked(&s, 5.0).await;

  let d = s.donations().donate(&ctx, donation(r, f, 5.0)).await.unwrap();
  assert_eq!(d.quantity, 5.0);
  assert_eq!(d.resource_id, r);

  let after = s.resources().find_one_by_id(&ctx, r).await.unwrap();
  assert_eq!(after.quantity, 0.0);

  let err = s.donations().donate(&ctx, donation(r, f, 0.1)).await.unwrap_err();
  assert!(matches!(err, Error::Negative(ref m) if *m == format!("resource {r} quantity is 0.0")));
}

#[tokio::test]
async fn overdraw_leaves_no_trace() {
  let s = store().await;
  let ctx = ctx();
  let (r, f) = stocked(&s, 5.0).await;

  let err = s.donations().donate(&ctx, donation(r, f, 10.0)).await.unwrap_err();
  assert_eq!(err.to_string(), format!("resource {r} quantity is 5.0"));

  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 5.0);
  assert!(s.donations().find_by_resource(&ctx, r).await.unwrap().is_empty());
}

#[tokio::test]
async fn donate_to_missing_resource_is_not_found() {
  let s = store().await;
  let ctx = ctx();
  let (_, f) = stocked(&s, 5.0).await;

  let err = s.donations().donate(&ctx, donation(404, f, 1.0)).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(ref m) if m == "resource 404 not found"));
}

#[tokio::test]
async fn donate_to_deleted_resource_is_not_found() {
  let s = store().await;
  let ctx = ctx();
  let (r, f) = stocked(&s, 5.0).await;
  s.resources().delete(&ctx, r).await.unwrap();

  let err = s.donations().donate(&ctx, donation(r, f, 1.0)).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn donate_to_missing_family_rolls_back() {
  let s = store().await;
  let ctx = ctx();
  let (r, _) = stocked(&s, 5.0).await;

  let err = s.donations().donate(&ctx, donation(r, 999, 1.0)).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(ref m) if m == "family 999 not found"));

  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 5.0);
  assert!(s.donations().find_by_resource(&ctx, r).await.unwrap().is_empty());
}

#[tokio::test]
async fn stock_is_checked_before_family() {
  let s = store().await;
  let ctx = ctx();
  let (r, _) = stocked(&s, 1.0).await;

  let err = s.donations().donate(&ctx, donation(r, 999, 2.0)).await.unwrap_err();
  assert!(matches!(err, Error::Negative(_)));
}

#[tokio::test]
async fn donate_then_return_restores_stock() {
  let s = store().await;
  let ctx = ctx();
  let (r, f) = stocked(&s, 10.0).await;
  let other = s.families().create(&ctx, silva()).await.unwrap();

  s.donations().donate(&ctx, donation(r, f, 2.0)).await.unwrap();
  s.donations().donate(&ctx, donation(r, other.id, 3.0)).await.unwrap();
  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 5.0);

  let ledger = s.donations().find_by_resource(&ctx, r).await.unwrap();
  assert_eq!(ledger.len(), 2);
  assert!(ledger[0].id < ledger[1].id);

  let refund = s.donations().return_donations(&ctx, r).await.unwrap();
  assert_eq!(refund.entries, 2);
  assert_eq!(refund.quantity, 5.0);
  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 10.0);
  assert!(s.donations().find_by_resource(&ctx, r).await.unwrap().is_empty());

  let err = s.donations().return_donations(&ctx, r).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(ref m) if *m == format!("resource {r} not found")));
}

#[tokio::test]
async fn cancelled_request_never_commits() {
  let s = store().await;
  let ctx = ctx();
  let (r, f) = stocked(&s, 5.0).await;

  let cancelled = RequestContext::new("/test");
  cancelled.cancel();
  let err = s
    .donations()
    .donate(&cancelled, donation(r, f, 1.0))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Fatal(_) | Error::Cancelled(_)));

  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 5.0);
  assert!(s.donations().find_by_resource(&ctx, r).await.unwrap().is_empty());
}

// ─── On-disk databases ───────────────────────────────────────────────────────

fn file_config() -> PoolConfig {
  PoolConfig {
    max_open: 4,
    max_idle: 2,
    max_lifetime: Some(Duration::from_secs(60)),
    busy_timeout: Duration::from_secs(5),
  }
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("almoner.db");
  let ctx = ctx();

  let id = {
    let s = SqliteStore::open(&path, file_config()).await.unwrap();
    s.resources().create(&ctx, rice(7.0)).await.unwrap().id
  };

  let s = SqliteStore::open(&path, file_config()).await.unwrap();
  let r = s.resources().find_one_by_id(&ctx, id).await.unwrap();
  assert_eq!(r.quantity, 7.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_donations_of_full_stock_serialize() {
  let dir = tempfile::tempdir().unwrap();
  let s = SqliteStore::open(dir.path().join("almoner.db"), file_config())
    .await
    .unwrap();
  let (r, f) = stocked(&s, 5.0).await;

  let donations = s.donations();
  let (first, second) = (ctx(), ctx());
  let (a, b) = tokio::join!(
    donations.donate(&first, donation(r, f, 5.0)),
    donations.donate(&second, donation(r, f, 5.0)),
  );

  let outcomes = [a, b];
  assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
  assert!(
    outcomes
      .iter()
      .any(|o| matches!(o, Err(Error::Negative(m)) if m == &format!("resource {r} quantity is 0.0")))
  );

  let ctx = ctx();
  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 0.0);
  assert_eq!(s.donations().find_by_resource(&ctx, r).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stock_never_goes_negative_under_contention() {
  let dir = tempfile::tempdir().unwrap();
  let s = SqliteStore::open(dir.path().join("almoner.db"), file_config())
    .await
    .unwrap();
  let (r, f) = stocked(&s, 1.0).await;

  let mut tasks = tokio::task::JoinSet::new();
  for _ in 0..8 {
    let donations = s.donations();
    tasks.spawn(async move {
      let ctx = ctx();
      donations.donate(&ctx, donation(r, f, 0.25)).await
    });
  }

  let mut succeeded = 0;
  while let Some(outcome) = tasks.join_next().await {
    match outcome.unwrap() {
      Ok(_) => succeeded += 1,
      Err(Error::Negative(_)) => {}
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!(succeeded, 4);

  let ctx = ctx();
  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 0.0);
}

#[tokio::test]
async fn queued_writer_gives_up_at_its_deadline() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("almoner.db");
  let s = SqliteStore::open(&path, file_config()).await.unwrap();
  let (r, f) = stocked(&s, 5.0).await;

  let holder = rusqlite::Connection::open(&path).unwrap();
  holder.execute_batch("BEGIN IMMEDIATE").unwrap();

  let hurried = RequestContext::new("/test").with_timeout(Duration::from_millis(200));
  let started = std::time::Instant::now();
  let err = s
    .donations()
    .donate(&hurried, donation(r, f, 1.0))
    .await
    .unwrap_err();
  let waited = started.elapsed();

  assert!(matches!(err, Error::Fatal(_) | Error::Cancelled(_)), "{err}");
  assert!(waited < Duration::from_secs(2), "waited {waited:?}");

  holder.execute_batch("ROLLBACK").unwrap();

  let ctx = ctx();
  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 5.0);
  s.donations().donate(&ctx, donation(r, f, 1.0)).await.unwrap();
  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 4.0);
}

#[tokio::test]
async fn queued_writer_proceeds_once_lock_is_released() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("almoner.db");
  let s = SqliteStore::open(&path, file_config()).await.unwrap();
  let (r, f) = stocked(&s, 5.0).await;

  let holder = rusqlite::Connection::open(&path).unwrap();
  holder.execute_batch("BEGIN IMMEDIATE").unwrap();
  let release = std::thread::spawn(move || {
    std::thread::sleep(Duration::from_millis(300));
    holder.execute_batch("ROLLBACK").unwrap();
  });

  let ctx = ctx();
  s.donations().donate(&ctx, donation(r, f, 2.0)).await.unwrap();
  release.join().unwrap();
  assert_eq!(s.resources().find_one_by_id(&ctx, r).await.unwrap().quantity, 3.0);
}
