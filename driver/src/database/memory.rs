//! Process-local store with the same row-locking contract as the PostgreSQL driver.
//!
//! Each transaction buffers its writes and publishes them atomically on commit. Row locks
//! are held until commit or rollback; waiting lockers are woken when any transaction ends.

mod copy;
mod customer;
mod film;
mod plan;
mod quota;
mod rental;

pub use self::{copy::*, customer::*, film::*, plan::*, quota::*, rental::*};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use error_stack::Report;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tokio::sync::Notify;
use uuid::Uuid;

use kernel::interface::clock::{Clock, DependOnClock};
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{
    DependOnCopyQuery, DependOnCustomerQuery, DependOnFilmQuery, DependOnPlanQuery,
    DependOnQuotaQuery, DependOnRentalQuery,
};
use kernel::interface::update::{DependOnCopyModifier, DependOnRentalModifier};
use kernel::prelude::entity::{
    CopyId, Customer, CustomerId, Film, FilmCopy, FilmDuration, FilmId, FilmTitle, IsAvailable,
    LoanDays, Plan, PlanCode, PlanCost, PlanName, ReleaseYear, Rental, RentalLimit,
};
use kernel::KernelError;

const DEFAULT_LOCK_WAIT: std::time::Duration = std::time::Duration::from_secs(5);

/// Committed rows of every table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    plans: BTreeMap<String, Plan>,
    customers: BTreeMap<i64, Customer>,
    films: BTreeMap<i64, Film>,
    copies: BTreeMap<String, FilmCopy>,
    rentals: BTreeMap<i64, Rental>,
}

impl Snapshot {
    pub fn copies(&self) -> impl Iterator<Item = &FilmCopy> {
        self.copies.values()
    }

    pub fn copy(&self, id: &str) -> Option<&FilmCopy> {
        self.copies.get(id)
    }

    pub fn rentals(&self) -> impl Iterator<Item = &Rental> {
        self.rentals.values()
    }

    fn apply(&mut self, writes: &WriteSet) {
        for copy in writes.copies.values() {
            self.copies.insert(copy.id().as_ref().clone(), copy.clone());
        }
        for rental in writes.rentals.values() {
            self.rentals.insert(*rental.id().as_ref(), rental.clone());
        }
    }

    /// Mirrors the partial unique index on `rentals(copy_id) WHERE returned_at IS NULL`.
    fn check_open_rentals(&self) -> error_stack::Result<(), KernelError> {
        let mut open = HashSet::new();
        for rental in self.rentals.values().filter(|rental| rental.is_open()) {
            if !open.insert(rental.copy_id()) {
                return Err(Report::new(KernelError::Internal).attach_printable(format!(
                    "Copy {} would have more than one open rental",
                    rental.copy_id().as_ref()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct WriteSet {
    copies: BTreeMap<String, FilmCopy>,
    rentals: BTreeMap<i64, Rental>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(in crate::database) enum RowKey {
    Customer(i64),
    Copy(String),
    Rental(i64),
}

#[derive(Default)]
struct Store {
    committed: Snapshot,
    locks: HashMap<RowKey, Uuid>,
}

#[derive(Default)]
struct Shared {
    store: Mutex<Store>,
    released: Notify,
    sequence: AtomicI64,
}

impl Shared {
    fn store(&self) -> error_stack::Result<MutexGuard<'_, Store>, KernelError> {
        self.store.lock().map_err(|_| {
            Report::new(KernelError::Internal).attach_printable("In-memory store is poisoned")
        })
    }

    fn release(&self, owner: &Uuid) {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        store.locks.retain(|_, holder| holder != owner);
        drop(store);
        self.released.notify_waiters();
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct InMemoryDatabase {
    shared: Arc<Shared>,
    clock: ManualClock,
    lock_wait: std::time::Duration,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self {
            shared: Arc::default(),
            clock: ManualClock::new(OffsetDateTime::now_utc()),
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// How long a transaction waits for a held row lock before failing with `Timeout`.
    pub fn with_lock_wait(mut self, lock_wait: std::time::Duration) -> Self {
        self.lock_wait = lock_wait;
        self
    }

    /// Inserts reference rows directly into the committed state.
    pub fn seed(&self, seed: Seed) -> error_stack::Result<(), KernelError> {
        let mut store = self.shared.store()?;
        let Seed(rows) = seed;
        store.committed.plans.extend(rows.plans);
        store.committed.customers.extend(rows.customers);
        store.committed.films.extend(rows.films);
        store.committed.copies.extend(rows.copies);
        store.committed.rentals.extend(rows.rentals);
        Ok(())
    }

    pub fn snapshot(&self) -> error_stack::Result<Snapshot, KernelError> {
        Ok(self.shared.store()?.committed.clone())
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for reference data. Plans get a zero cost and films placeholder metadata.
#[derive(Debug, Default)]
pub struct Seed(Snapshot);

impl Seed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(mut self, code: &str, rental_limit: i32, loan_days: Option<i32>) -> Self {
        let plan = Plan::new(
            PlanCode::new(code),
            PlanName::new(code),
            PlanCost::new(Decimal::ZERO),
            RentalLimit::new(rental_limit),
            loan_days.map(LoanDays::new),
        );
        self.0.plans.insert(code.to_string(), plan);
        self
    }

    pub fn customer(mut self, id: i64, plan_code: &str) -> Self {
        let customer = Customer::new(CustomerId::new(id), PlanCode::new(plan_code));
        self.0.customers.insert(id, customer);
        self
    }

    pub fn film(mut self, id: i64, title: &str) -> Self {
        let film = Film::new(
            FilmId::new(id),
            FilmTitle::new(title),
            ReleaseYear::new(2000),
            FilmDuration::new(120),
            None,
            None,
            None,
        );
        self.0.films.insert(id, film);
        self
    }

    pub fn copy(mut self, id: impl Into<String>, film_id: i64, available: bool) -> Self {
        let id = id.into();
        let copy = FilmCopy::new(
            CopyId::new(id.clone()),
            FilmId::new(film_id),
            IsAvailable::new(available),
        );
        self.0.copies.insert(id, copy);
        self
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        Ok(InMemoryTransaction {
            id: Uuid::new_v4(),
            shared: Arc::clone(&self.shared),
            writes: WriteSet::default(),
            lock_wait: self.lock_wait,
            finished: false,
        })
    }
}

pub struct InMemoryTransaction {
    id: Uuid,
    shared: Arc<Shared>,
    writes: WriteSet,
    lock_wait: std::time::Duration,
    finished: bool,
}

impl InMemoryTransaction {
    /// Runs `select` over the committed rows overlaid with this transaction's own writes.
    pub(in crate::database) fn read<R>(
        &self,
        select: impl FnOnce(&Snapshot) -> R,
    ) -> error_stack::Result<R, KernelError> {
        let mut view = self.shared.store()?.committed.clone();
        view.apply(&self.writes);
        Ok(select(&view))
    }

    /// Takes an exclusive lock on `key`, waiting for the current holder to finish.
    pub(in crate::database) async fn lock(
        &self,
        key: RowKey,
    ) -> error_stack::Result<(), KernelError> {
        tokio::time::timeout(self.lock_wait, self.wait_for_lock(&key))
            .await
            .map_err(|_| {
                Report::new(KernelError::Timeout)
                    .attach_printable(format!("Lock wait on {:?} timed out", key))
            })?
    }

    async fn wait_for_lock(&self, key: &RowKey) -> error_stack::Result<(), KernelError> {
        loop {
            let released = self.shared.released.notified();
            if self.try_lock(key)? {
                return Ok(());
            }
            released.await;
        }
    }

    fn try_lock(&self, key: &RowKey) -> error_stack::Result<bool, KernelError> {
        let mut store = self.shared.store()?;
        match store.locks.get(key) {
            Some(holder) if *holder != self.id => Ok(false),
            Some(_) => Ok(true),
            None => {
                store.locks.insert(key.clone(), self.id);
                Ok(true)
            }
        }
    }

    /// Locks and returns the first candidate nobody else holds. Held rows are skipped,
    /// never waited on.
    pub(in crate::database) fn lock_first_unlocked<T>(
        &self,
        select: impl FnOnce(&Snapshot) -> Vec<(RowKey, T)>,
    ) -> error_stack::Result<Option<T>, KernelError> {
        let mut store = self.shared.store()?;
        let mut view = store.committed.clone();
        view.apply(&self.writes);
        for (key, row) in select(&view) {
            match store.locks.get(&key) {
                Some(holder) if *holder != self.id => continue,
                Some(_) => return Ok(Some(row)),
                None => {
                    store.locks.insert(key, self.id);
                    return Ok(Some(row));
                }
            }
        }
        Ok(None)
    }

    pub(in crate::database) fn next_sequence(&self) -> i64 {
        self.shared.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(in crate::database) fn stage_copy(&mut self, copy: FilmCopy) {
        self.writes.copies.insert(copy.id().as_ref().clone(), copy);
    }

    pub(in crate::database) fn stage_rental(&mut self, rental: Rental) {
        self.writes.rentals.insert(*rental.id().as_ref(), rental);
    }

    fn publish(&self) -> error_stack::Result<(), KernelError> {
        let mut store = self.shared.store()?;
        let mut next = store.committed.clone();
        next.apply(&self.writes);
        next.check_open_rentals()?;
        store.committed = next;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(mut self) -> error_stack::Result<(), KernelError> {
        self.finished = true;
        let published = self.publish();
        self.shared.release(&self.id);
        published
    }

    async fn roll_back(mut self) -> error_stack::Result<(), KernelError> {
        self.finished = true;
        self.shared.release(&self.id);
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.release(&self.id);
        }
    }
}

impl DependOnClock for InMemoryDatabase {
    type Clock = ManualClock;
    fn clock(&self) -> &Self::Clock {
        &self.clock
    }
}

impl DependOnCustomerQuery for InMemoryDatabase {
    type CustomerQuery = InMemoryCustomerRepository;
    fn customer_query(&self) -> &Self::CustomerQuery {
        &InMemoryCustomerRepository
    }
}

impl DependOnPlanQuery for InMemoryDatabase {
    type PlanQuery = InMemoryPlanRepository;
    fn plan_query(&self) -> &Self::PlanQuery {
        &InMemoryPlanRepository
    }
}

impl DependOnFilmQuery for InMemoryDatabase {
    type FilmQuery = InMemoryFilmRepository;
    fn film_query(&self) -> &Self::FilmQuery {
        &InMemoryFilmRepository
    }
}

impl DependOnCopyQuery for InMemoryDatabase {
    type CopyQuery = InMemoryCopyRepository;
    fn copy_query(&self) -> &Self::CopyQuery {
        &InMemoryCopyRepository
    }
}

impl DependOnCopyModifier for InMemoryDatabase {
    type CopyModifier = InMemoryCopyRepository;
    fn copy_modifier(&self) -> &Self::CopyModifier {
        &InMemoryCopyRepository
    }
}

impl DependOnRentalQuery for InMemoryDatabase {
    type RentalQuery = InMemoryRentalRepository;
    fn rental_query(&self) -> &Self::RentalQuery {
        &InMemoryRentalRepository
    }
}

impl DependOnRentalModifier for InMemoryDatabase {
    type RentalModifier = InMemoryRentalRepository;
    fn rental_modifier(&self) -> &Self::RentalModifier {
        &InMemoryRentalRepository
    }
}

impl DependOnQuotaQuery for InMemoryDatabase {
    type QuotaQuery = InMemoryQuotaRepository;
    fn quota_query(&self) -> &Self::QuotaQuery {
        &InMemoryQuotaRepository
    }
}
