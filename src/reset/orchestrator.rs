//! Two-phase reset orchestration.
//!
//! A confirmed run drives two branches concurrently:
//! - tiered bulk deletes, each tier polled to completion before the next
//! - a single concurrent batch of snapshot upserts
//!
//! Errors in either branch surface as notifications and stay contained to the
//! run; the completion notification fires once both branches settle.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time;
use tracing::info;
use uuid::Uuid;

use crate::confirm::{Confirmation, ConfirmationGate};
use crate::error::AppError;
use crate::notify::{Notifier, Severity};
use crate::reset::backend::ResetBackend;
use crate::reset::plan;
use crate::state::ResetState;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Question shown before anything is touched.
pub const CONFIRM_MESSAGE: &str = "Are you sure you want to reset the training environment?";

/// Notification once both branches have settled.
pub const SUCCESS_MESSAGE: &str = "The training environment has been successfully reset.";

/// Delay between job-status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

// ─────────────────────────────────────────────────────────────────────────────
// ResetReport
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one reset run.
///
/// Every failure from both branches is retained here, even though the
/// notification sink only ever sees the first upsert failure.
#[derive(Debug)]
pub struct ResetReport {
    /// False when the confirmation prompt was dismissed.
    pub confirmed: bool,
    /// Errors surfaced while submitting or polling delete jobs.
    pub delete_failures: Vec<AppError>,
    /// Errors collected from the upsert batch.
    pub upsert_failures: Vec<AppError>,
}

impl ResetReport {
    fn cancelled() -> Self {
        Self {
            confirmed: false,
            delete_failures: Vec::new(),
            upsert_failures: Vec::new(),
        }
    }

    /// True when no error was surfaced by either branch.
    pub fn is_clean(&self) -> bool {
        self.delete_failures.is_empty() && self.upsert_failures.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResetOrchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Drives a full training-environment reset.
pub struct ResetOrchestrator {
    /// Remote operations (Apex REST in production, scripted in tests).
    backend: Arc<dyn ResetBackend>,
    /// User-facing notification sink.
    notifier: Arc<dyn Notifier>,
    /// Run status observable by the presentation layer.
    state: Arc<ResetState>,
    /// Delay between job-status polls.
    poll_interval: Duration,
}

impl ResetOrchestrator {
    /// Creates an orchestrator with the default 1-second poll interval.
    pub fn new(
        backend: Arc<dyn ResetBackend>,
        notifier: Arc<dyn Notifier>,
        state: Arc<ResetState>,
    ) -> Self {
        Self {
            backend,
            notifier,
            state,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the delay between job-status polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs one reset: confirm, delete + repopulate concurrently, notify.
    ///
    /// A dismissed prompt is a no-op: no remote call is made and the run state
    /// stays `Idle`. After confirmation, both branches surface their own error
    /// notifications and the completion notification fires regardless of them;
    /// the report and the final `Done`/`Failed` state record what actually
    /// happened.
    pub async fn run(&self, gate: &dyn ConfirmationGate) -> ResetReport {
        if gate.prompt(CONFIRM_MESSAGE) != Confirmation::Reset {
            info!("[RESET] cancelled at the confirmation prompt");
            return ResetReport::cancelled();
        }

        let run_id = Uuid::new_v4();
        self.state.begin().await;
        info!("[RESET] run {} started", run_id);

        let (delete_failures, upsert_failures) =
            tokio::join!(self.mass_delete(), self.upsert_records());

        self.notifier.notify(SUCCESS_MESSAGE, Severity::Success);

        let report = ResetReport {
            confirmed: true,
            delete_failures,
            upsert_failures,
        };
        self.state.finish(report.is_clean()).await;

        info!(
            "[RESET] run {} finished ({} delete failures, {} upsert failures)",
            run_id,
            report.delete_failures.len(),
            report.upsert_failures.len()
        );

        report
    }

    /// Deletes trainee-created records tier by tier.
    ///
    /// Submissions within a tier are issued one after another but are
    /// independent jobs; the tier is then polled as a set. A surfaced error
    /// does not stop the remaining tiers.
    async fn mass_delete(&self) -> Vec<AppError> {
        let mut failures = Vec::new();

        for (tier_index, tier) in plan::DELETION_TIERS.iter().enumerate() {
            info!(
                "[RESET] deletion tier {} ({} objects)",
                tier_index + 1,
                tier.objects.len()
            );

            let mut job_ids = Vec::with_capacity(tier.objects.len());
            for s_object in tier.objects {
                match self.backend.submit_delete(s_object).await {
                    Ok(job_id) => job_ids.push(job_id),
                    Err(err) => {
                        self.notify_error(&err);
                        failures.push(err);
                    }
                }
            }

            if job_ids.is_empty() {
                continue;
            }

            if let Err(err) = self.await_completion(&job_ids).await {
                self.notify_error(&err);
                failures.push(err);
            }
        }

        failures
    }

    /// Polls until every job in the set reports complete.
    ///
    /// Re-polls with the same identifier set after a fixed delay for as long
    /// as the service answers false. There is no timeout; a stuck job keeps
    /// the run waiting.
    async fn await_completion(&self, job_ids: &[String]) -> Result<(), AppError> {
        loop {
            if self.backend.poll_jobs(job_ids).await? {
                return Ok(());
            }
            time::sleep(self.poll_interval).await;
        }
    }

    /// Repopulates every snapshot target as one concurrent batch.
    ///
    /// Waits for all upserts to settle and keeps every failure; only the first
    /// one (in batch order) reaches the notification sink.
    async fn upsert_records(&self) -> Vec<AppError> {
        let results = join_all(
            plan::UPSERT_TARGETS
                .iter()
                .map(|target| self.backend.submit_upsert(target.object, target.snapshot)),
        )
        .await;

        let failures: Vec<AppError> = results.into_iter().filter_map(Result::err).collect();

        if let Some(first) = failures.first() {
            self.notify_error(first);
        }

        failures
    }

    fn notify_error(&self, err: &AppError) {
        self.notifier.notify(&err.user_message(), Severity::Error);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use crate::state::RunStatus;

    // ─────────────────────────────────────────────────────────────────────────
    // Scripted fakes
    // ─────────────────────────────────────────────────────────────────────────

    /// One recorded backend call, in arrival order.
    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Delete(String),
        /// `all_complete` is None when the poll was scripted to fail.
        Poll {
            job_ids: Vec<String>,
            all_complete: Option<bool>,
        },
        Upsert(String),
    }

    /// Backend fake that records every call and follows a poll script.
    #[derive(Default)]
    struct ScriptedBackend {
        calls: Mutex<Vec<Call>>,
        poll_script: Mutex<VecDeque<Result<bool, AppError>>>,
        poll_times: Mutex<Vec<Instant>>,
        upsert_errors: Mutex<HashMap<&'static str, String>>,
        next_job: AtomicUsize,
        observed_state: Mutex<Option<Arc<ResetState>>>,
        saw_busy: AtomicBool,
    }

    impl ScriptedBackend {
        fn script_polls(&self, script: Vec<Result<bool, AppError>>) {
            *self.poll_script.lock().unwrap() = script.into();
        }

        fn fail_upsert(&self, snapshot: &'static str, message: &str) {
            self.upsert_errors
                .lock()
                .unwrap()
                .insert(snapshot, message.to_string());
        }

        fn watch_state(&self, state: Arc<ResetState>) {
            *self.observed_state.lock().unwrap() = Some(state);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn poll_times(&self) -> Vec<Instant> {
            self.poll_times.lock().unwrap().clone()
        }

        fn delete_calls(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Delete(object) => Some(object),
                    _ => None,
                })
                .collect()
        }

        fn upsert_calls(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Upsert(snapshot) => Some(snapshot),
                    _ => None,
                })
                .collect()
        }

        /// Indices of poll calls within the full call sequence.
        fn poll_positions(&self) -> Vec<usize> {
            self.calls()
                .iter()
                .enumerate()
                .filter_map(|(i, c)| matches!(c, Call::Poll { .. }).then_some(i))
                .collect()
        }

        fn position_of_delete(&self, object: &str) -> usize {
            self.calls()
                .iter()
                .position(|c| matches!(c, Call::Delete(o) if o.as_str() == object))
                .unwrap_or_else(|| panic!("no delete call for {}", object))
        }
    }

    #[async_trait]
    impl ResetBackend for ScriptedBackend {
        async fn submit_delete(&self, s_object: &str) -> Result<String, AppError> {
            let observed = self.observed_state.lock().unwrap().clone();
            if let Some(state) = observed {
                if state.is_busy().await {
                    self.saw_busy.store(true, Ordering::SeqCst);
                }
            }

            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(s_object.to_string()));

            let n = self.next_job.fetch_add(1, Ordering::SeqCst);
            Ok(format!("750xx{:012}", n))
        }

        async fn poll_jobs(&self, job_ids: &[String]) -> Result<bool, AppError> {
            let result = self
                .poll_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(true));

            self.poll_times.lock().unwrap().push(Instant::now());
            self.calls.lock().unwrap().push(Call::Poll {
                job_ids: job_ids.to_vec(),
                all_complete: result.as_ref().ok().copied(),
            });

            result
        }

        async fn submit_upsert(
            &self,
            _s_object: &str,
            static_resource: &str,
        ) -> Result<(), AppError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Upsert(static_resource.to_string()));

            match self.upsert_errors.lock().unwrap().get(static_resource) {
                Some(message) => Err(AppError::SalesforceError(message.clone())),
                None => Ok(()),
            }
        }
    }

    /// Notifier fake recording every notification in order.
    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<(String, Severity)>>,
    }

    impl RecordingNotifier {
        fn events(&self) -> Vec<(String, Severity)> {
            self.events.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|(m, s)| (s == Severity::Error).then_some(m))
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str, severity: Severity) {
            self.events
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
        }
    }

    /// Gate fake with a fixed answer.
    struct ScriptedGate(Confirmation);

    impl ConfirmationGate for ScriptedGate {
        fn prompt(&self, _message: &str) -> Confirmation {
            self.0
        }
    }

    fn fixture() -> (
        Arc<ScriptedBackend>,
        Arc<RecordingNotifier>,
        Arc<ResetState>,
        ResetOrchestrator,
    ) {
        let backend = Arc::new(ScriptedBackend::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = Arc::new(ResetState::new());
        let orchestrator = ResetOrchestrator::new(
            backend.clone(),
            notifier.clone(),
            state.clone(),
        );
        (backend, notifier, state, orchestrator)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Confirmation outcomes
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn cancelled_prompt_is_a_no_op() {
        let (backend, notifier, state, orchestrator) = fixture();

        let report = orchestrator.run(&ScriptedGate(Confirmation::Cancel)).await;

        assert!(!report.confirmed);
        assert!(report.is_clean());
        assert!(backend.calls().is_empty(), "no remote call may be made");
        assert!(notifier.events().is_empty(), "no notification may fire");
        assert_eq!(state.status().await, RunStatus::Idle);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Happy path
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn confirmed_run_issues_every_call_exactly_once() {
        let (backend, notifier, state, orchestrator) = fixture();
        backend.watch_state(state.clone());

        let report = orchestrator.run(&ScriptedGate(Confirmation::Reset)).await;

        assert!(report.confirmed);
        assert!(report.is_clean());

        // 16 deletes across the three tiers, each object exactly once.
        let deletes = backend.delete_calls();
        assert_eq!(deletes.len(), 16);
        let unique: HashSet<_> = deletes.iter().collect();
        assert_eq!(unique.len(), 16);

        // One poll per tier when the first answer is already true.
        assert_eq!(backend.poll_positions().len(), 3);

        // All 19 snapshots upserted exactly once.
        let upserts = backend.upsert_calls();
        assert_eq!(upserts.len(), 19);
        let expected: HashSet<_> = plan::UPSERT_TARGETS.iter().map(|t| t.snapshot).collect();
        let actual: HashSet<&str> = upserts.iter().map(String::as_str).collect();
        assert_eq!(actual, expected);

        // One notification: the fixed success message.
        assert_eq!(
            notifier.events(),
            vec![(SUCCESS_MESSAGE.to_string(), Severity::Success)]
        );

        // Busy while running, Done afterwards.
        assert!(backend.saw_busy.load(Ordering::SeqCst));
        assert!(!state.is_busy().await);
        assert_eq!(state.status().await, RunStatus::Done);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tier sequencing
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn tiers_run_strictly_in_order() {
        let (backend, _notifier, _state, orchestrator) = fixture();

        orchestrator.run(&ScriptedGate(Confirmation::Reset)).await;

        let polls = backend.poll_positions();
        assert_eq!(polls.len(), 3);

        // Every tier-1 object is submitted before the tier's first poll…
        for object in plan::DELETION_TIERS[0].objects {
            assert!(
                backend.position_of_delete(object) < polls[0],
                "{} must be submitted before tier 1 is polled",
                object
            );
        }

        // …and no tier-2 submission happens until tier 1 polled complete.
        for object in plan::DELETION_TIERS[1].objects {
            let position = backend.position_of_delete(object);
            assert!(position > polls[0], "{} ran before tier 1 finished", object);
            assert!(position < polls[1], "{} ran after tier 2 was polled", object);
        }

        // Account goes last, only after tier 2 polled complete.
        assert!(backend.position_of_delete("Account") > polls[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_repeats_with_the_same_jobs_until_complete() {
        let (backend, _notifier, _state, orchestrator) = fixture();
        backend.script_polls(vec![Ok(false), Ok(true), Ok(true), Ok(true)]);

        orchestrator.run(&ScriptedGate(Confirmation::Reset)).await;

        // Tier 1 polls twice, tiers 2 and 3 once each.
        let polls: Vec<Call> = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Poll { .. }))
            .collect();
        assert_eq!(polls.len(), 4);

        // The retry re-sends the identical identifier set.
        let (first, second) = (&polls[0], &polls[1]);
        match (first, second) {
            (
                Call::Poll { job_ids: a, .. },
                Call::Poll { job_ids: b, .. },
            ) => {
                assert_eq!(a, b);
                assert_eq!(a.len(), plan::DELETION_TIERS[0].objects.len());
            }
            _ => unreachable!(),
        }

        // At least the fixed delay elapses between the two polls.
        let times = backend.poll_times();
        assert!(times[1] - times[0] >= Duration::from_secs(1));

        // Tier 2 only starts after the retry answered true.
        let poll_positions = backend.poll_positions();
        for object in plan::DELETION_TIERS[1].objects {
            assert!(backend.position_of_delete(object) > poll_positions[1]);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Error containment
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn poll_error_surfaces_once_and_later_tiers_still_run() {
        let (backend, notifier, state, orchestrator) = fixture();
        backend.script_polls(vec![
            Err(AppError::SalesforceError(
                "[UNABLE_TO_LOCK_ROW] try again later".into(),
            )),
            Ok(true),
            Ok(true),
        ]);

        let report = orchestrator.run(&ScriptedGate(Confirmation::Reset)).await;

        // The failed status check does not stop tiers 2 and 3.
        assert_eq!(backend.delete_calls().len(), 16);
        assert_eq!(backend.poll_positions().len(), 3);

        let errors = notifier.errors();
        assert_eq!(errors, vec!["[UNABLE_TO_LOCK_ROW] try again later"]);

        // The completion notification still fires, last.
        let events = notifier.events();
        assert_eq!(
            events.last(),
            Some(&(SUCCESS_MESSAGE.to_string(), Severity::Success))
        );

        assert!(!report.is_clean());
        assert_eq!(report.delete_failures.len(), 1);
        assert_eq!(state.status().await, RunStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn upsert_failures_surface_only_the_first_message() {
        let (backend, notifier, state, orchestrator) = fixture();
        backend.fail_upsert("Training_Leads", "[DUPLICATE_VALUE] lead already exists");
        backend.fail_upsert("Training_Contacts", "[DUPLICATE_VALUE] contact already exists");

        let report = orchestrator.run(&ScriptedGate(Confirmation::Reset)).await;

        // Every target is still attempted; the batch settles as a whole.
        assert_eq!(backend.upsert_calls().len(), 19);

        // One error notification, carrying the first failure in batch order.
        let errors = notifier.errors();
        assert_eq!(errors, vec!["[DUPLICATE_VALUE] lead already exists"]);

        // The completion notification still fires.
        let events = notifier.events();
        assert_eq!(
            events.last(),
            Some(&(SUCCESS_MESSAGE.to_string(), Severity::Success))
        );

        // Both failures stay available in the report.
        assert_eq!(report.upsert_failures.len(), 2);
        assert_eq!(state.status().await, RunStatus::Failed);

        // The delete branch is unaffected.
        assert_eq!(backend.delete_calls().len(), 16);
        assert_eq!(backend.poll_positions().len(), 3);
    }
}
