pub mod machine;
mod sse;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{models::QuizStatus, quiz_store::QuizStore},
    error::ServiceError,
};

pub use self::machine::{AbortError, ApplyError, Plan, PlanError, PlanId, SessionEvent};
pub use self::sse::SessionHubs;
use self::machine::SessionStateMachine;

/// Cheaply clonable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Upper bound on the side-effect work of a single session transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state storing the persistence collaborator handle,
/// per-session state machines, and the SSE fan-out registry.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn QuizStore>>>,
    sse: SessionHubs,
    machines: DashMap<Uuid, Arc<RwLock<SessionStateMachine>>>,
    transition_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let sse = SessionHubs::new(config.sse_capacity);
        Arc::new(Self {
            config,
            store: RwLock::new(None),
            sse,
            machines: DashMap::new(),
            transition_gates: DashMap::new(),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current quiz store, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the quiz store or fail with the degraded-mode error.
    pub async fn require_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn QuizStore>) {
        let mut guard = self.store.write().await;
        *guard = Some(store);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        let mut guard = self.store.write().await;
        guard.take();
    }

    /// Whether the application currently has no storage backend.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Per-session broadcast hubs used for the SSE streams.
    pub fn sse(&self) -> &SessionHubs {
        &self.sse
    }

    /// Forget all in-memory state for one session (machine, gate, SSE channel).
    pub fn forget_session(&self, quiz_id: Uuid) {
        self.machines.remove(&quiz_id);
        self.transition_gates.remove(&quiz_id);
        self.sse.remove(quiz_id);
    }

    /// Get or hydrate the state machine for one session.
    fn machine_for(&self, quiz_id: Uuid, hydrate: QuizStatus) -> Arc<RwLock<SessionStateMachine>> {
        self.machines
            .entry(quiz_id)
            .or_insert_with(|| Arc::new(RwLock::new(SessionStateMachine::new(hydrate))))
            .clone()
    }

    /// Serialize transitions of one session behind its gate mutex.
    fn transition_gate(&self, quiz_id: Uuid) -> Arc<Mutex<()>> {
        self.transition_gates.entry(quiz_id).or_default().clone()
    }

    /// Run one session transition: plan the event, execute its side-effect
    /// work, then commit (or abort) the planned status change.
    ///
    /// Transitions for the same session are serialized by a per-session gate,
    /// and the commit is a compare-and-swap on the machine's status and
    /// version, so two simultaneous organizer actions can never interleave.
    /// The work closure receives the validated `from` status and must perform
    /// all persistence writes; when it errors or times out the plan is
    /// aborted and the session status is left unchanged.
    pub async fn run_session_transition<F, Fut, T>(
        &self,
        quiz_id: Uuid,
        hydrate: QuizStatus,
        event: SessionEvent,
        work: F,
    ) -> Result<(T, QuizStatus), ServiceError>
    where
        F: FnOnce(QuizStatus) -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let machine = self.machine_for(quiz_id, hydrate);
        let gate = self.transition_gate(quiz_id);
        let gate_guard = gate.lock().await;

        let plan = {
            let mut sm = machine.write().await;
            sm.plan(event)?
        };
        let Plan {
            id: plan_id, from, ..
        } = plan;

        let work_future = work(from);
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    let mut sm = machine.write().await;
                    if let Err(abort_err) = sm.abort(plan_id) {
                        warn!(
                            %quiz_id,
                            ?event,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate_guard);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = {
                    let mut sm = machine.write().await;
                    sm.apply(plan_id)?
                };
                drop(gate_guard);
                Ok((value, next))
            }
            Err(err) => {
                let mut sm = machine.write().await;
                if let Err(abort_err) = sm.abort(plan_id) {
                    warn!(
                        %quiz_id,
                        ?event,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(sm);
                drop(gate_guard);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::quiz_store::memory::MemoryStore;

    #[tokio::test]
    async fn store_outages_surface_as_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        state.install_store(Arc::new(MemoryStore::new())).await;
        assert!(!state.is_degraded().await);
        assert!(state.require_store().await.is_ok());

        state.clear_store().await;
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn failed_transition_work_leaves_status_unchanged() {
        let state = AppState::new(AppConfig::default());
        let quiz_id = Uuid::new_v4();

        let result: Result<((), QuizStatus), ServiceError> = state
            .run_session_transition(quiz_id, QuizStatus::Draft, SessionEvent::Start, |_| async {
                Err(ServiceError::EmptyQuiz)
            })
            .await;
        assert!(matches!(result, Err(ServiceError::EmptyQuiz)));

        // The aborted plan left the machine in draft, so starting again works.
        let (_, next) = state
            .run_session_transition(quiz_id, QuizStatus::Draft, SessionEvent::Start, |_| async {
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(next, QuizStatus::Active);
    }
}
