//! Client-side cache of jobs and users with optimistic writes.
//!
//! State is held in two layers: the confirmed layer holds what the backend
//! last returned, and a pending overlay holds values written locally but not
//! yet acknowledged. Readers always see the overlay applied on top of the
//! confirmed layer, taken under one read lock.
//!
//! A mutation runs in two phases. Phase 1 evaluates the change against the
//! current view under the write lock and stages the result in the overlay,
//! tagged with a fresh attempt token. Phase 2 awaits the backend with no lock
//! held, then either reconciles (refetch and drop the overlay entry in one
//! commit) or reverts (drop the overlay entry). An entry is only dropped by
//! the attempt that staged it.
//!
//! At most one attempt per entity is in flight. A second attempt on an entity
//! with a staged value is refused before anything is staged, so no write is
//! ever built on top of a value the backend has not accepted.
//!
//! Every refetch takes a ticket when it starts. A refetch that completes after
//! a newer ticket has committed is discarded.

use crate::backend::{Backend, BackendResult};
use crate::error::{Result, SyncError};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};
use valpro_core::config::PricingConfig;
use valpro_core::job::new_job_id;
use valpro_core::{lifecycle, CertificationStatus, Event, EventContext, Job, NewJob, User, ValproError};

const EVENT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A consistent view of the store at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub jobs: Vec<Job>,
    pub users: Vec<User>,
    pub current_user: Option<User>,
    pub is_loading: bool,
}

impl Snapshot {
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Job(String),
    User(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Job(id) => write!(f, "job {id}"),
            EntityKey::User(id) => write!(f, "user {id}"),
        }
    }
}

/// Change notifications published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A refetch replaced the confirmed layer.
    Loaded,
    /// A local value was staged ahead of the backend.
    Optimistic(EntityKey),
    /// The backend accepted a write.
    Confirmed(EntityKey),
    /// The backend rejected a write and the staged value was dropped.
    Reverted(EntityKey),
    LoggedIn(String),
    LoggedOut,
}

/// A requested change, dispatched by [`Store::mutate`].
#[derive(Debug, Clone)]
pub enum Intent {
    UpdateJob { job_id: String, event: Event },
    CreateJob(NewJob),
    UpdateUser(User),
    UpdateCertificationStatus {
        user_id: String,
        cert_name: String,
        status: CertificationStatus,
    },
}

/// The entity a mutation produced, as confirmed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutated {
    Job(Job),
    User(User),
}

impl Mutated {
    pub fn into_job(self) -> Option<Job> {
        match self {
            Mutated::Job(job) => Some(job),
            Mutated::User(_) => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Mutated::User(user) => Some(user),
            Mutated::Job(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

trait Keyed: Clone {
    fn key_id(&self) -> &str;
}

impl Keyed for Job {
    fn key_id(&self) -> &str {
        &self.id
    }
}

impl Keyed for User {
    fn key_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug)]
struct Pending<T> {
    token: u64,
    value: T,
}

#[derive(Debug, Default)]
struct State {
    jobs: Vec<Job>,
    users: Vec<User>,
    pending_jobs: HashMap<String, Pending<Job>>,
    pending_users: HashMap<String, Pending<User>>,
    /// The user as of login; superseded by fresher data in `users`.
    session: Option<User>,
    loads_in_flight: usize,
    committed_ticket: u64,
}

impl State {
    fn job(&self, id: &str) -> Option<&Job> {
        lookup(&self.jobs, &self.pending_jobs, id)
    }

    fn user(&self, id: &str) -> Option<&User> {
        lookup(&self.users, &self.pending_users, id)
    }

    fn current_user(&self) -> Option<User> {
        let session = self.session.as_ref()?;
        Some(self.user(&session.id).unwrap_or(session).clone())
    }

    fn entity(&self, key: &EntityKey) -> Option<Mutated> {
        match key {
            EntityKey::Job(id) => self.job(id).cloned().map(Mutated::Job),
            EntityKey::User(id) => self.user(id).cloned().map(Mutated::User),
        }
    }

    fn in_flight(&self, key: &EntityKey) -> bool {
        match key {
            EntityKey::Job(id) => self.pending_jobs.contains_key(id),
            EntityKey::User(id) => self.pending_users.contains_key(id),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            jobs: overlay(&self.jobs, &self.pending_jobs),
            users: overlay(&self.users, &self.pending_users),
            current_user: self.current_user(),
            is_loading: self.loads_in_flight > 0,
        }
    }

    fn stage(&mut self, key: &EntityKey, token: u64, value: Mutated) {
        match (key, value) {
            (EntityKey::Job(id), Mutated::Job(job)) => {
                self.pending_jobs
                    .insert(id.clone(), Pending { token, value: job });
            }
            (EntityKey::User(id), Mutated::User(user)) => {
                self.pending_users
                    .insert(id.clone(), Pending { token, value: user });
            }
            _ => {}
        }
    }

    /// Remove the staged value for `key` if `token` staged it.
    fn unstage(&mut self, key: &EntityKey, token: u64) -> bool {
        match key {
            EntityKey::Job(id) => remove_if_token(&mut self.pending_jobs, id, token),
            EntityKey::User(id) => remove_if_token(&mut self.pending_users, id, token),
        }
    }

    /// Write a backend echo straight into the confirmed layer.
    fn confirm(&mut self, value: Mutated) {
        match value {
            Mutated::Job(job) => upsert(&mut self.jobs, job),
            Mutated::User(user) => upsert(&mut self.users, user),
        }
    }

    /// Replace the confirmed layer unless a newer ticket already committed.
    fn commit(&mut self, ticket: u64, jobs: Vec<Job>, users: Vec<User>) -> bool {
        if ticket < self.committed_ticket {
            debug!(
                ticket,
                committed = self.committed_ticket,
                "discarding stale refetch"
            );
            return false;
        }
        self.committed_ticket = ticket;
        self.jobs = jobs;
        self.users = users;
        debug!(
            ticket,
            jobs = self.jobs.len(),
            users = self.users.len(),
            "refetch committed"
        );
        true
    }

    fn clear(&mut self, session: Option<User>, ticket: u64) {
        self.jobs.clear();
        self.users.clear();
        self.pending_jobs.clear();
        self.pending_users.clear();
        self.session = session;
        self.committed_ticket = self.committed_ticket.max(ticket);
    }
}

fn lookup<'a, T: Keyed>(
    confirmed: &'a [T],
    pending: &'a HashMap<String, Pending<T>>,
    id: &str,
) -> Option<&'a T> {
    pending
        .get(id)
        .map(|p| &p.value)
        .or_else(|| confirmed.iter().find(|c| c.key_id() == id))
}

/// Confirmed values in order, each replaced by its staged value if any,
/// followed by staged values with no confirmed counterpart in staging order.
fn overlay<T: Keyed>(confirmed: &[T], pending: &HashMap<String, Pending<T>>) -> Vec<T> {
    let mut out: Vec<T> = confirmed
        .iter()
        .map(|c| pending.get(c.key_id()).map_or(c, |p| &p.value).clone())
        .collect();
    let mut extra: Vec<&Pending<T>> = pending
        .values()
        .filter(|p| !confirmed.iter().any(|c| c.key_id() == p.value.key_id()))
        .collect();
    extra.sort_by_key(|p| p.token);
    out.extend(extra.into_iter().map(|p| p.value.clone()));
    out
}

fn remove_if_token<T>(pending: &mut HashMap<String, Pending<T>>, id: &str, token: u64) -> bool {
    if pending.get(id).is_some_and(|p| p.token == token) {
        pending.remove(id);
        true
    } else {
        false
    }
}

fn in_flight_error(event: &str, status: impl ToString, key: &EntityKey) -> SyncError {
    ValproError::invalid(
        event,
        status,
        format!("another change to {key} is still in flight"),
    )
    .into()
}

fn upsert<T: Keyed>(items: &mut Vec<T>, value: T) {
    match items.iter_mut().find(|i| i.key_id() == value.key_id()) {
        Some(slot) => *slot = value,
        None => items.push(value),
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct Store {
    backend: Arc<dyn Backend>,
    pricing: PricingConfig,
    state: RwLock<State>,
    events: broadcast::Sender<StoreEvent>,
    attempts: AtomicU64,
    tickets: AtomicU64,
}

impl Store {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            pricing: PricingConfig::default(),
            state: RwLock::new(State::default()),
            events,
            attempts: AtomicU64::new(0),
            tickets: AtomicU64::new(0),
        }
    }

    /// Fees charged for jobs created through this store.
    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_attempt(&self) -> u64 {
        self.attempts.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Change notifications as a stream. Events missed by a lagging reader
    /// are skipped.
    pub fn changes(&self) -> impl Stream<Item = StoreEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|r| async move { r.ok() })
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.current_user()
    }

    pub async fn job(&self, id: &str) -> Option<Job> {
        self.state.read().await.job(id).cloned()
    }

    pub async fn user(&self, id: &str) -> Option<User> {
        self.state.read().await.user(id).cloned()
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Start a session for `user`, discarding any cached data, then load.
    pub async fn login(&self, user: User) -> Result<Snapshot> {
        let ticket = self.next_ticket();
        self.state.write().await.clear(Some(user.clone()), ticket);
        info!(user = %user.id, "logged in");
        self.emit(StoreEvent::LoggedIn(user.id.clone()));
        self.load().await
    }

    /// Log in as the backend user with `user_id`.
    pub async fn login_as(&self, user_id: &str) -> Result<Snapshot> {
        let user = self
            .backend
            .users_get_all()
            .await?
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| SyncError::UserNotFound(user_id.to_string()))?;
        self.login(user).await
    }

    /// End the session. Local data is cleared even when the backend call
    /// fails; the failure is still returned.
    pub async fn logout(&self) -> Result<()> {
        let result = self.backend.auth_logout().await;
        let ticket = self.next_ticket();
        self.state.write().await.clear(None, ticket);
        match &result {
            Ok(()) => info!("logged out"),
            Err(e) => warn!(error = %e, "backend logout failed; local session cleared"),
        }
        self.emit(StoreEvent::LoggedOut);
        result.map_err(SyncError::from)
    }

    pub async fn register_push_token(&self, token: &str) -> Result<bool> {
        if self.current_user().await.is_none() {
            debug!("push token not registered: logged out");
            return Ok(false);
        }
        self.backend.notifications_register_push_token(token).await?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    async fn begin_fetch(&self) -> u64 {
        let ticket = self.next_ticket();
        self.state.write().await.loads_in_flight += 1;
        ticket
    }

    async fn fetch_all(&self) -> BackendResult<(Vec<Job>, Vec<User>)> {
        tokio::try_join!(self.backend.jobs_get_all(), self.backend.users_get_all())
    }

    /// Fetch jobs and users concurrently and replace the confirmed layer.
    pub async fn load(&self) -> Result<Snapshot> {
        let ticket = self.begin_fetch().await;
        let fetched = self.fetch_all().await;

        let mut state = self.state.write().await;
        state.loads_in_flight = state.loads_in_flight.saturating_sub(1);
        let committed = match fetched {
            Ok((jobs, users)) => state.commit(ticket, jobs, users),
            Err(e) => {
                warn!(error = %e, "refetch failed");
                return Err(e.into());
            }
        };
        let snapshot = state.snapshot();
        drop(state);

        if committed {
            self.emit(StoreEvent::Loaded);
        }
        Ok(snapshot)
    }

    /// Refresh on every item of `signals` while a user is logged in.
    pub fn spawn_push_listener<S>(self: &Arc<Self>, signals: S) -> JoinHandle<()>
    where
        S: Stream + Send + 'static,
        S::Item: Send,
    {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut signals = Box::pin(signals);
            while signals.next().await.is_some() {
                if store.current_user().await.is_none() {
                    debug!("push signal ignored: logged out");
                    continue;
                }
                if let Err(e) = store.load().await {
                    warn!(error = %e, "push-triggered refresh failed");
                }
            }
            debug!("push listener stopped");
        })
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub async fn mutate(&self, intent: Intent) -> Result<Mutated> {
        match intent {
            Intent::UpdateJob { job_id, event } => {
                self.update_job(&job_id, event).await.map(Mutated::Job)
            }
            Intent::CreateJob(draft) => self.create_job(draft).await.map(Mutated::Job),
            Intent::UpdateUser(user) => self.update_user(user).await.map(Mutated::User),
            Intent::UpdateCertificationStatus {
                user_id,
                cert_name,
                status,
            } => self
                .update_certification_status(&user_id, &cert_name, status)
                .await
                .map(Mutated::User),
        }
    }

    /// Apply a lifecycle event to a job as the current user.
    pub async fn update_job(&self, job_id: &str, event: Event) -> Result<Job> {
        let key = EntityKey::Job(job_id.to_string());
        let (next, token) = {
            let mut state = self.state.write().await;
            let actor = state.current_user().ok_or(SyncError::NotLoggedIn)?;
            let job = state
                .job(job_id)
                .ok_or_else(|| SyncError::JobNotFound(job_id.to_string()))?;
            if state.in_flight(&key) {
                return Err(in_flight_error(event.name(), job.status, &key));
            }
            let next = lifecycle::apply(job, &event, &EventContext::now(&actor))?;
            let token = self.next_attempt();
            state.stage(&key, token, Mutated::Job(next.clone()));
            (next, token)
        };
        debug!(job = job_id, event = event.name(), token, "staged job update");
        self.emit(StoreEvent::Optimistic(key.clone()));

        let written = self.backend.jobs_update(&next).await.map(Mutated::Job);
        self.settle(key, token, written).await.map(|m| m.into_job().unwrap_or(next))
    }

    /// Commission a new job as the current user.
    pub async fn create_job(&self, draft: NewJob) -> Result<Job> {
        let (job, key, token) = {
            let mut state = self.state.write().await;
            let actor = state.current_user().ok_or(SyncError::NotLoggedIn)?;
            let price = self.pricing.price_for(draft.vehicle.car_type);
            let job =
                lifecycle::create_job(new_job_id(), draft, price, &EventContext::now(&actor))?;
            let key = EntityKey::Job(job.id.clone());
            let token = self.next_attempt();
            state.stage(&key, token, Mutated::Job(job.clone()));
            (job, key, token)
        };
        debug!(job = %job.id, token, "staged job creation");
        self.emit(StoreEvent::Optimistic(key.clone()));

        let written = self.backend.jobs_create(&job).await.map(Mutated::Job);
        self.settle(key, token, written).await.map(|m| m.into_job().unwrap_or(job))
    }

    /// Replace a user's profile. Users edit their own profile; admins may
    /// edit anyone's. Identity fields and review outcomes cannot change.
    pub async fn update_user(&self, user: User) -> Result<User> {
        let key = EntityKey::User(user.id.clone());
        let token = {
            let mut state = self.state.write().await;
            let actor = state.current_user().ok_or(SyncError::NotLoggedIn)?;
            let original = state
                .user(&user.id)
                .ok_or_else(|| SyncError::UserNotFound(user.id.clone()))?;
            if actor.id != user.id && !actor.is_admin() {
                return Err(ValproError::invalid(
                    "update_user",
                    "profile",
                    format!("{} cannot edit the profile of {}", actor.id, user.id),
                )
                .into());
            }
            if state.in_flight(&key) {
                return Err(in_flight_error("update_user", "profile", &key));
            }
            user.check_update_of(original)?;
            let token = self.next_attempt();
            state.stage(&key, token, Mutated::User(user.clone()));
            token
        };
        debug!(user = %user.id, token, "staged user update");
        self.emit(StoreEvent::Optimistic(key.clone()));

        let written = self.backend.users_update(&user).await.map(Mutated::User);
        self.settle(key, token, written).await.map(|m| m.into_user().unwrap_or(user))
    }

    /// Review a pending certification. Only an admin may do this.
    pub async fn update_certification_status(
        &self,
        user_id: &str,
        cert_name: &str,
        status: CertificationStatus,
    ) -> Result<User> {
        let key = EntityKey::User(user_id.to_string());
        let (next, token) = {
            let mut state = self.state.write().await;
            let actor = state.current_user().ok_or(SyncError::NotLoggedIn)?;
            if !actor.is_admin() {
                return Err(ValproError::invalid(
                    "update_certification_status",
                    CertificationStatus::Pending,
                    format!("a {} cannot review certifications", actor.user_type),
                )
                .into());
            }
            let mut next = state
                .user(user_id)
                .cloned()
                .ok_or_else(|| SyncError::UserNotFound(user_id.to_string()))?;
            if state.in_flight(&key) {
                return Err(in_flight_error("update_certification_status", "profile", &key));
            }
            next.set_certification_status(cert_name, status)?;
            let token = self.next_attempt();
            state.stage(&key, token, Mutated::User(next.clone()));
            (next, token)
        };
        debug!(user = user_id, cert = cert_name, %status, token, "staged certification review");
        self.emit(StoreEvent::Optimistic(key.clone()));

        let written = self
            .backend
            .users_update_certification_status(user_id, cert_name, status)
            .await
            .map(|()| Mutated::User(next.clone()));
        self.settle(key, token, written).await.map(|m| m.into_user().unwrap_or(next))
    }

    /// Phase 2: reconcile after the backend accepted a write, or revert after
    /// it refused one.
    async fn settle(
        &self,
        key: EntityKey,
        token: u64,
        written: BackendResult<Mutated>,
    ) -> Result<Mutated> {
        let echo = match written {
            Ok(echo) => echo,
            Err(e) => {
                self.state.write().await.unstage(&key, token);
                warn!(entity = %key, error = %e, "write failed; staged value reverted");
                self.emit(StoreEvent::Reverted(key));
                if let Err(refetch) = self.load().await {
                    warn!(error = %refetch, "refetch after failed write also failed");
                }
                return Err(SyncError::BackendUnavailable(e));
            }
        };

        let ticket = self.begin_fetch().await;
        let fetched = self.fetch_all().await;

        let mut state = self.state.write().await;
        state.loads_in_flight = state.loads_in_flight.saturating_sub(1);
        state.unstage(&key, token);
        let committed = match fetched {
            Ok((jobs, users)) => state.commit(ticket, jobs, users),
            Err(e) => {
                warn!(entity = %key, error = %e, "refetch after write failed; keeping backend echo");
                if ticket > state.committed_ticket {
                    state.confirm(echo.clone());
                }
                false
            }
        };
        let confirmed = state.entity(&key).unwrap_or(echo);
        drop(state);

        debug!(entity = %key, token, "write confirmed");
        self.emit(StoreEvent::Confirmed(key));
        if committed {
            self.emit(StoreEvent::Loaded);
        }
        Ok(confirmed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tokio::sync::Notify;
    use valpro_core::types::{CarType, JobStatus};
    use valpro_core::vehicle::{Location, Vehicle};

    /// Wraps a memory backend and can hold reads or job writes until released.
    #[derive(Default)]
    struct GatedBackend {
        inner: MemoryBackend,
        hold_reads: AtomicBool,
        hold_writes: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl GatedBackend {
        fn seeded() -> Self {
            Self {
                inner: MemoryBackend::seeded(),
                ..Default::default()
            }
        }

        async fn gate(&self, flag: &AtomicBool) {
            if flag.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
        }
    }

    #[async_trait]
    impl Backend for GatedBackend {
        async fn jobs_get_all(&self) -> BackendResult<Vec<Job>> {
            // Data is read before the gate so a held call returns stale data.
            let jobs = self.inner.jobs_get_all().await?;
            self.gate(&self.hold_reads).await;
            Ok(jobs)
        }

        async fn jobs_create(&self, job: &Job) -> BackendResult<Job> {
            self.inner.jobs_create(job).await
        }

        async fn jobs_update(&self, job: &Job) -> BackendResult<Job> {
            self.gate(&self.hold_writes).await;
            self.inner.jobs_update(job).await
        }

        async fn users_get_all(&self) -> BackendResult<Vec<User>> {
            self.inner.users_get_all().await
        }

        async fn users_update(&self, user: &User) -> BackendResult<User> {
            self.inner.users_update(user).await
        }

        async fn users_update_certification_status(
            &self,
            user_id: &str,
            cert_name: &str,
            status: CertificationStatus,
        ) -> BackendResult<()> {
            self.inner
                .users_update_certification_status(user_id, cert_name, status)
                .await
        }

        async fn auth_logout(&self) -> BackendResult<()> {
            self.inner.auth_logout().await
        }

        async fn notifications_register_push_token(&self, token: &str) -> BackendResult<()> {
            self.inner.notifications_register_push_token(token).await
        }
    }

    async fn store_as(user_id: &str) -> (Arc<MemoryBackend>, Store) {
        let backend = Arc::new(MemoryBackend::seeded());
        let store = Store::new(backend.clone());
        store.login_as(user_id).await.unwrap();
        (backend, store)
    }

    fn sedan() -> NewJob {
        NewJob {
            vehicle: Vehicle {
                make: "Toyota".into(),
                model: "Corolla".into(),
                year: 2019,
                vin: "JTDBR32E720123456".into(),
                image_url: String::new(),
                car_type: Some(CarType::Small),
                location: Location {
                    lat: -1.2921,
                    lng: 36.8219,
                    address: "Nairobi, Kenya".into(),
                },
            },
            notes: None,
            photos: Vec::new(),
        }
    }

    #[tokio::test]
    async fn login_loads_data_and_current_user() {
        let (_, store) = store_as("user-1").await;
        let snap = store.snapshot().await;
        assert_eq!(snap.jobs.len(), 5);
        assert_eq!(snap.users.len(), 5);
        assert_eq!(snap.current_user.unwrap().name, "Alice Johnson");
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn login_as_unknown_user_fails() {
        let store = Store::new(Arc::new(MemoryBackend::seeded()));
        let err = store.login_as("user-99").await.unwrap_err();
        assert!(matches!(err, SyncError::UserNotFound(_)));
        assert!(store.current_user().await.is_none());
    }

    #[tokio::test]
    async fn mutations_require_a_session() {
        let backend = Arc::new(MemoryBackend::seeded());
        let store = Store::new(backend.clone());
        store.load().await.unwrap();
        let err = store
            .update_job("job-12345", Event::AddComment { text: "hi".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotLoggedIn));
        assert_eq!(backend.writes(), 0);
    }

    #[tokio::test]
    async fn update_job_round_trips_through_backend() {
        let (backend, store) = store_as("user-3").await;
        let job = store
            .update_job(
                "job-12345",
                Event::SubmitReport {
                    report_url: "/reports/job-12345.pdf".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::ReportReady);

        // A fresh load returns what the backend stored.
        let snap = store.load().await.unwrap();
        assert_eq!(snap.job("job-12345").unwrap(), &job);
        let stored = backend
            .dataset()
            .await
            .jobs
            .into_iter()
            .find(|j| j.id == "job-12345")
            .unwrap();
        assert_eq!(stored, job);
    }

    #[tokio::test]
    async fn invalid_transition_never_reaches_backend() {
        let (backend, store) = store_as("user-1").await;
        let before = store.snapshot().await;
        let err = store
            .update_job("job-67890", Event::CapturePayment { open_bidding: false })
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(backend.writes(), 0);
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn validation_error_never_reaches_backend() {
        let (backend, store) = store_as("user-3").await;
        let err = store
            .update_job(
                "job-12345",
                Event::SubmitReport {
                    report_url: "  ".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(backend.writes(), 0);
    }

    #[tokio::test]
    async fn unknown_job_is_reported() {
        let (_, store) = store_as("user-1").await;
        let err = store
            .update_job("job-nope", Event::AddComment { text: "hi".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::JobNotFound(id) if id == "job-nope"));
    }

    #[tokio::test]
    async fn backend_failure_reverts_to_confirmed_state() {
        let (backend, store) = store_as("user-1").await;
        let mut events = store.subscribe();
        let before = store.job("job-ABCDE").await.unwrap();

        backend.fail_next(1);
        let err = store
            .update_job(
                "job-ABCDE",
                Event::AcceptBid {
                    valuer_id: "user-5".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_backend());
        assert_eq!(store.job("job-ABCDE").await.unwrap(), before);
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Optimistic(EntityKey::Job("job-ABCDE".into()))
        );
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Reverted(EntityKey::Job("job-ABCDE".into()))
        );

        // No retry happened; a second attempt succeeds.
        let job = store
            .update_job(
                "job-ABCDE",
                Event::AcceptBid {
                    valuer_id: "user-5".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.valuer.unwrap().id, "user-5");
    }

    #[tokio::test]
    async fn staged_value_visible_while_write_in_flight() {
        let backend = Arc::new(GatedBackend::seeded());
        let store = Arc::new(Store::new(backend.clone()));
        store.login_as("user-1").await.unwrap();
        backend.hold_writes.store(true, Ordering::SeqCst);

        let task = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .update_job(
                        "job-12345",
                        Event::AddComment {
                            text: "Is the report on track?".into(),
                        },
                    )
                    .await
            })
        };
        backend.entered.notified().await;

        let staged = store.job("job-12345").await.unwrap();
        assert_eq!(staged.comments.len(), 1);
        let persisted = backend.inner.dataset().await;
        assert!(persisted.jobs.iter().all(|j| j.comments.is_empty()));

        backend.release.notify_one();
        let confirmed = task.await.unwrap().unwrap();
        assert_eq!(confirmed.comments[0].text, "Is the report on track?");
        assert_eq!(store.job("job-12345").await.unwrap(), confirmed);
    }

    #[tokio::test]
    async fn stale_refetch_is_discarded() {
        let backend = Arc::new(GatedBackend::seeded());
        let store = Arc::new(Store::new(backend.clone()));
        store.login_as("user-3").await.unwrap();

        backend.hold_reads.store(true, Ordering::SeqCst);
        let slow = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.load().await })
        };
        backend.entered.notified().await;
        assert!(store.snapshot().await.is_loading);

        // A newer write lands and reconciles while the slow load is held.
        store
            .update_job(
                "job-12345",
                Event::SubmitReport {
                    report_url: "/reports/job-12345.pdf".into(),
                },
            )
            .await
            .unwrap();

        backend.release.notify_one();
        slow.await.unwrap().unwrap();

        let snap = store.snapshot().await;
        assert_eq!(snap.job("job-12345").unwrap().status, JobStatus::ReportReady);
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn create_job_appears_then_confirms() {
        let (backend, store) = store_as("user-2").await;
        let job = store.create_job(sedan()).await.unwrap();
        assert_eq!(job.status, JobStatus::PendingPayment);
        assert_eq!(job.payment_info.as_ref().unwrap().amount, 4000);
        assert_eq!(job.client.id, "user-2");

        let snap = store.snapshot().await;
        assert_eq!(snap.jobs.len(), 6);
        assert!(backend.dataset().await.jobs.iter().any(|j| j.id == job.id));
    }

    #[tokio::test]
    async fn create_job_uses_configured_pricing() {
        let backend = Arc::new(MemoryBackend::seeded());
        let store = Store::new(backend).with_pricing(PricingConfig {
            small: 3500,
            big: 7000,
        });
        store.login_as("user-1").await.unwrap();
        let mut draft = sedan();
        draft.vehicle.car_type = Some(CarType::Big);
        let job = store.create_job(draft).await.unwrap();
        assert_eq!(job.payment_info.unwrap().amount, 7000);
    }

    #[tokio::test]
    async fn valuer_cannot_create_jobs() {
        let (backend, store) = store_as("user-3").await;
        let err = store.create_job(sedan()).await.unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(backend.writes(), 0);
        assert_eq!(store.snapshot().await.jobs.len(), 5);
    }

    #[tokio::test]
    async fn update_user_keeps_identity() {
        let (_, store) = store_as("user-3").await;
        let mut me = store.current_user().await.unwrap();
        me.location = Some("Mombasa, Kenya".into());
        let saved = store.update_user(me.clone()).await.unwrap();
        assert_eq!(saved.location.as_deref(), Some("Mombasa, Kenya"));
        // The current user follows the confirmed profile.
        assert_eq!(store.current_user().await.unwrap(), saved);

        me.user_type = valpro_core::UserType::Admin;
        let err = store.update_user(me).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn failed_write_is_not_carried_by_a_later_attempt() {
        let backend = Arc::new(GatedBackend::seeded());
        let store = Arc::new(Store::new(backend.clone()));
        store.login_as("user-1").await.unwrap();
        let before = store.job("job-ABCDE").await.unwrap();
        backend.hold_writes.store(true, Ordering::SeqCst);
        backend.inner.fail_next(1);

        let accept = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .update_job(
                        "job-ABCDE",
                        Event::AcceptBid {
                            valuer_id: "user-5".into(),
                        },
                    )
                    .await
            })
        };
        backend.entered.notified().await;

        // The accepted bid is only staged; nothing may be written on top of it.
        let err = store
            .update_job(
                "job-ABCDE",
                Event::AddComment {
                    text: "Please start soon".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition(), "got {err}");

        backend.release.notify_one();
        assert!(accept.await.unwrap().unwrap_err().is_backend());

        let stored = backend
            .inner
            .dataset()
            .await
            .jobs
            .into_iter()
            .find(|j| j.id == "job-ABCDE")
            .unwrap();
        assert_eq!(stored, before);
        assert_eq!(store.job("job-ABCDE").await.unwrap(), before);

        // Once settled, the next attempt sees only confirmed data.
        let job = store
            .update_job(
                "job-ABCDE",
                Event::AddComment {
                    text: "Please start soon".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::OpenForBids);
        assert!(job.valuer.is_none());
        assert_eq!(job.comments.len(), 1);
    }

    #[tokio::test]
    async fn users_edit_only_their_own_profile() {
        let (backend, store) = store_as("user-5").await;
        let mut charlie = store.user("user-3").await.unwrap();
        charlie.location = Some("Kisumu, Kenya".into());
        let err = store.update_user(charlie.clone()).await.unwrap_err();
        assert!(err.is_invalid_transition(), "got {err}");
        assert_eq!(backend.writes(), 0);
        assert_ne!(
            store.user("user-3").await.unwrap().location.as_deref(),
            Some("Kisumu, Kenya")
        );

        store.login_as("user-4").await.unwrap();
        let saved = store.update_user(charlie).await.unwrap();
        assert_eq!(saved.location.as_deref(), Some("Kisumu, Kenya"));
    }

    #[tokio::test]
    async fn profile_update_cannot_self_verify() {
        let (backend, store) = store_as("user-5").await;
        let before = store.current_user().await.unwrap();
        assert!(!before.certifications.is_empty());

        let mut me = before.clone();
        for cert in &mut me.certifications {
            cert.status = CertificationStatus::Verified;
        }
        me.verified = true;
        let err = store.update_user(me).await.unwrap_err();
        assert!(err.is_invalid_transition(), "got {err}");
        assert_eq!(backend.writes(), 0);
        assert_eq!(store.current_user().await.unwrap(), before);

        let mut badge_only = before.clone();
        badge_only.verified = true;
        assert!(store
            .update_user(badge_only)
            .await
            .unwrap_err()
            .is_invalid_transition());

        let stored = backend
            .dataset()
            .await
            .users
            .into_iter()
            .find(|u| u.id == "user-5")
            .unwrap();
        assert_eq!(stored, before);
    }

    #[tokio::test]
    async fn admin_reviews_certifications() {
        let (backend, store) = store_as("user-4").await;
        let name = "Heavy Commercial Vehicle Certification";
        let eve = store
            .update_certification_status("user-5", name, CertificationStatus::Verified)
            .await
            .unwrap();
        assert_eq!(
            eve.certification(name).unwrap().status,
            CertificationStatus::Verified
        );
        let stored = backend
            .dataset()
            .await
            .users
            .into_iter()
            .find(|u| u.id == "user-5")
            .unwrap();
        assert_eq!(stored, eve);

        let err = store
            .update_certification_status("user-5", name, CertificationStatus::Rejected)
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[tokio::test]
    async fn non_admin_cannot_review_certifications() {
        let (backend, store) = store_as("user-3").await;
        let err = store
            .update_certification_status(
                "user-5",
                "Heavy Commercial Vehicle Certification",
                CertificationStatus::Verified,
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(backend.writes(), 0);

        // The role is checked before the certification is looked up.
        let err = store
            .update_certification_status("user-5", "No Such Cert", CertificationStatus::Verified)
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition(), "got {err}");
    }

    #[tokio::test]
    async fn mutate_dispatches_intents() {
        let (_, store) = store_as("user-1").await;
        let out = store
            .mutate(Intent::UpdateJob {
                job_id: "job-KLMNO".into(),
                event: Event::AddComment {
                    text: "Any valuers nearby?".into(),
                },
            })
            .await
            .unwrap();
        let job = out.into_job().unwrap();
        assert_eq!(job.comments.len(), 1);
    }

    #[tokio::test]
    async fn logout_clears_cache_and_calls_backend() {
        let (backend, store) = store_as("user-1").await;
        let mut events = store.subscribe();
        store.logout().await.unwrap();
        assert_eq!(backend.logouts(), 1);
        assert_eq!(store.snapshot().await, Snapshot::default());
        assert_eq!(events.recv().await.unwrap(), StoreEvent::LoggedOut);
        assert!(!store.register_push_token("tok").await.unwrap());
    }

    #[tokio::test]
    async fn push_token_registered_while_logged_in() {
        let (backend, store) = store_as("user-3").await;
        assert!(store.register_push_token("ExponentPushToken[x]").await.unwrap());
        assert_eq!(
            backend.dataset().await.push_tokens,
            vec!["ExponentPushToken[x]"]
        );
    }

    #[tokio::test]
    async fn push_signal_triggers_reload() {
        let (backend, store) = store_as("user-1").await;
        let store = Arc::new(store);
        let (tx, rx) = tokio::sync::mpsc::channel::<()>(4);
        let listener = store.spawn_push_listener(tokio_stream::wrappers::ReceiverStream::new(rx));
        let mut changes = Box::pin(store.changes());

        // Another party changes the job on the backend.
        let mut job = backend
            .dataset()
            .await
            .jobs
            .into_iter()
            .find(|j| j.id == "job-FGHIJ")
            .unwrap();
        job.notes = Some("Gate code 4411".into());
        backend.jobs_update(&job).await.unwrap();

        tx.send(()).await.unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), changes.next())
            .await
            .unwrap();
        assert_eq!(event, Some(StoreEvent::Loaded));
        assert_eq!(
            store.job("job-FGHIJ").await.unwrap().notes.as_deref(),
            Some("Gate code 4411")
        );

        drop(tx);
        listener.await.unwrap();
    }

    #[test]
    fn older_attempt_cannot_drop_newer_staged_value() {
        let mut state = State::default();
        let job = valpro_core::mock::jobs().remove(0);
        let key = EntityKey::Job(job.id.clone());
        state.stage(&key, 1, Mutated::Job(job.clone()));
        state.stage(&key, 2, Mutated::Job(job.clone()));
        assert!(!state.unstage(&key, 1));
        assert!(state.job(&job.id).is_some());
        assert!(state.unstage(&key, 2));
        assert!(state.job(&job.id).is_none());
    }

    #[test]
    fn overlay_appends_new_entities_in_staging_order() {
        let mut state = State::default();
        let mut jobs = valpro_core::mock::jobs();
        let (a, b) = (jobs.remove(0), jobs.remove(0));
        state.stage(&EntityKey::Job(b.id.clone()), 2, Mutated::Job(b.clone()));
        state.stage(&EntityKey::Job(a.id.clone()), 1, Mutated::Job(a.clone()));
        let snap = state.snapshot();
        assert_eq!(snap.jobs, vec![a, b]);
    }
}
