//! Message handling: session lookup, state transitions, backend calls.

use std::future::Future;

use chrono::{Local, NaiveDate};
use tracing::{info, instrument, warn};

use pilelog_backend::BackendClient;
use pilelog_shared::{PileDrivingRecord, Result, SessionId, SubmissionResult};

use crate::dialogue::{Action, DialogueSettings, Event, transition};
use crate::reply::Outgoing;
use crate::session::SessionStore;

/// The two backend operations the dialogue depends on.
pub trait PileBackend: Send + Sync {
    /// Piles still awaiting driving, in display order.
    fn fetch_piles(&self, project_id: i64) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// File a completed record. Never retried.
    fn submit(&self, record: &PileDrivingRecord) -> impl Future<Output = SubmissionResult> + Send;
}

impl PileBackend for BackendClient {
    async fn fetch_piles(&self, project_id: i64) -> Result<Vec<String>> {
        BackendClient::fetch_piles(self, project_id).await
    }

    async fn submit(&self, record: &PileDrivingRecord) -> SubmissionResult {
        BackendClient::submit(self, record).await
    }
}

/// Routes operator text through the per-session state machine.
#[derive(Debug)]
pub struct Engine<B> {
    backend: B,
    sessions: SessionStore,
    settings: DialogueSettings,
}

impl<B: PileBackend> Engine<B> {
    pub fn new(backend: B, settings: DialogueSettings) -> Self {
        Self {
            backend,
            sessions: SessionStore::new(),
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    /// Handle `text` from `session_id`, resolving dates against the local calendar day.
    pub async fn handle(&self, session_id: SessionId, text: &str) -> Vec<Outgoing> {
        self.handle_on(session_id, text, Local::now().date_naive())
            .await
    }

    /// Handle `text` from `session_id` as if today were `today`.
    ///
    /// The session stays locked until every backend call triggered by the
    /// message has finished, so messages for one session apply in order.
    #[instrument(skip(self, text, today), fields(session = %session_id))]
    pub async fn handle_on(
        &self,
        session_id: SessionId,
        text: &str,
        today: NaiveDate,
    ) -> Vec<Outgoing> {
        let session = self.sessions.get(session_id).await;
        let mut session = session.lock().await;

        let mut replies = Vec::new();
        let mut event = Event::from_input(text, session.state.step());

        loop {
            let state = std::mem::take(&mut session.state);
            let step = transition(state, event, &self.settings, today);
            session.state = step.state;
            replies.extend(step.replies);

            event = match step.action {
                None => break,
                Some(Action::FetchPiles { project_id }) => {
                    let fetched = self.backend.fetch_piles(project_id).await;
                    if let Err(e) = &fetched {
                        warn!(error = %e, project_id, "could not load piles");
                    }
                    Event::PilesFetched(fetched.map_err(|e| e.to_string()))
                }
                Some(Action::Submit(record)) => {
                    let result = self.backend.submit(&record).await;
                    info!(
                        pile = %record.pile_number,
                        success = result.success,
                        status = %result.server_message,
                        "record submission finished"
                    );
                    Event::Submitted { record, result }
                }
            };
        }

        info!(step = ?session.state.step(), replies = replies.len(), "message handled");
        replies
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    use pilelog_shared::{Locale, PileLogError, midnight_utc};

    use super::*;
    use crate::dialogue::Step;
    use crate::reply::Keyboard;

    const CHAT: SessionId = SessionId(42);

    /// In-memory backend with a fixed pile list and a canned submit status.
    #[derive(Default)]
    struct FakeBackend {
        piles: Option<Vec<String>>,
        submit_result: Option<SubmissionResult>,
        submitted: StdMutex<Vec<PileDrivingRecord>>,
        fetches: StdMutex<Vec<i64>>,
    }

    impl FakeBackend {
        fn with_piles(piles: Vec<String>) -> Self {
            Self {
                piles: Some(piles),
                submit_result: Some(SubmissionResult::accepted("200 OK")),
                ..Default::default()
            }
        }

        fn failing_submit(mut self, status: &str) -> Self {
            self.submit_result = Some(SubmissionResult::rejected(status));
            self
        }

        fn submitted(&self) -> Vec<PileDrivingRecord> {
            self.submitted.lock().unwrap().clone()
        }
    }

    impl PileBackend for FakeBackend {
        async fn fetch_piles(&self, project_id: i64) -> Result<Vec<String>> {
            self.fetches.lock().unwrap().push(project_id);
            self.piles
                .clone()
                .ok_or_else(|| PileLogError::Network("connection refused".into()))
        }

        async fn submit(&self, record: &PileDrivingRecord) -> SubmissionResult {
            self.submitted.lock().unwrap().push(record.clone());
            self.submit_result
                .clone()
                .unwrap_or_else(|| SubmissionResult::rejected("no response"))
        }
    }

    fn piles(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("P-{i}")).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn engine(backend: FakeBackend) -> Engine<FakeBackend> {
        Engine::new(backend, DialogueSettings::default())
    }

    fn english(backend: FakeBackend) -> Engine<FakeBackend> {
        Engine::new(
            backend,
            DialogueSettings {
                locale: Locale::En,
                ..Default::default()
            },
        )
    }

    async fn send(engine: &Engine<FakeBackend>, text: &str) -> Vec<Outgoing> {
        engine.handle_on(CHAT, text, today()).await
    }

    async fn step(engine: &Engine<FakeBackend>) -> Step {
        let session = engine.sessions().get(CHAT).await;
        let step = session.lock().await.state.step();
        step
    }

    async fn pending(engine: &Engine<FakeBackend>) -> pilelog_shared::PendingRecord {
        let session = engine.sessions().get(CHAT).await;
        let record = session.lock().await.state.pending_record(engine.settings());
        record
    }

    /// Drive a fresh session up to the operator prompt with pile P-2.
    async fn reach_operator_step(engine: &Engine<FakeBackend>) {
        send(engine, "/newrecord").await;
        send(engine, "P-2").await;
        send(engine, "Today").await;
        send(engine, "12750").await;
        assert_eq!(step(engine).await, Step::EnteringOperator);
    }

    #[tokio::test]
    async fn drill_down_to_pile_seven() {
        let engine = engine(FakeBackend::with_piles(piles(20)));

        let replies = send(&engine, "/newrecord").await;
        assert_eq!(step(&engine).await, Step::SelectingPile);
        let top = replies[0].labels();
        assert_eq!(
            top,
            vec![
                "P-1..P-4",
                "P-5..P-8",
                "P-9..P-11",
                "P-12..P-14",
                "P-15..P-17",
                "P-18..P-20",
            ]
        );

        let replies = send(&engine, "P-5..P-8").await;
        assert_eq!(step(&engine).await, Step::SelectingPile);
        assert_eq!(replies[0].labels(), vec!["P-5", "P-6", "P-7", "P-8"]);

        send(&engine, "P-7").await;
        assert_eq!(step(&engine).await, Step::SelectingDate);
        assert_eq!(pending(&engine).await.pile_number.as_deref(), Some("P-7"));

        let session = engine.sessions().get(CHAT).await;
        assert!(session.lock().await.state.navigation_history().is_empty());
    }

    #[tokio::test]
    async fn nested_ranges_until_flat_list() {
        let engine = engine(FakeBackend::with_piles(piles(100)));

        let replies = send(&engine, "/newrecord").await;
        // 100 into 6: sizes 17,17,17,17,16,16
        assert_eq!(replies[0].labels()[0], "P-1..P-17");

        let replies = send(&engine, "P-1..P-17").await;
        // 17 into 6: sizes 3,3,3,3,3,2
        assert_eq!(replies[0].labels()[2], "P-7..P-9");

        let replies = send(&engine, "P-7..P-9").await;
        assert_eq!(replies[0].labels(), vec!["P-7", "P-8", "P-9"]);

        send(&engine, "P-8").await;
        assert_eq!(pending(&engine).await.pile_number.as_deref(), Some("P-8"));
    }

    #[tokio::test]
    async fn earlier_level_label_still_resolves() {
        let engine = engine(FakeBackend::with_piles(piles(20)));
        send(&engine, "/newrecord").await;
        send(&engine, "P-1..P-4").await;

        let replies = send(&engine, "P-18..P-20").await;
        assert_eq!(replies[0].labels(), vec!["P-18", "P-19", "P-20"]);
    }

    #[tokio::test]
    async fn unknown_group_label_reprompts() {
        let engine = engine(FakeBackend::with_piles(piles(20)));
        send(&engine, "/newrecord").await;

        let replies = send(&engine, "P-1..P-20").await;
        assert_eq!(step(&engine).await, Step::SelectingPile);
        assert_eq!(replies[0].text, "Неверный выбор группы. Попробуйте еще раз.");
    }

    #[tokio::test]
    async fn flat_list_rejects_other_piles() {
        let engine = engine(FakeBackend::with_piles(piles(20)));
        send(&engine, "/newrecord").await;
        send(&engine, "P-5..P-8").await;

        let replies = send(&engine, "P-12").await;
        assert_eq!(step(&engine).await, Step::SelectingPile);
        assert!(replies[0].text.starts_with("Неверный номер сваи"));
        assert_eq!(pending(&engine).await.pile_number, None);
    }

    #[tokio::test]
    async fn singleton_in_range_menu_is_selectable() {
        let engine = engine(FakeBackend::with_piles(piles(7)));
        let replies = send(&engine, "/newrecord").await;
        assert_eq!(replies[0].labels()[1], "P-3");

        send(&engine, "P-3").await;
        assert_eq!(step(&engine).await, Step::SelectingDate);
    }

    #[tokio::test]
    async fn date_menu_offers_two_choices() {
        let engine = engine(FakeBackend::with_piles(piles(3)));
        send(&engine, "/newrecord").await;

        let replies = send(&engine, "P-1").await;
        assert_eq!(
            replies[0].keyboard,
            Keyboard::Show(vec![vec!["Сегодня".into(), "Вчера".into()]])
        );
    }

    #[tokio::test]
    async fn today_resolves_to_current_date() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        send(&engine, "/newrecord").await;
        send(&engine, "P-1").await;

        let replies = send(&engine, "Today").await;
        assert_eq!(step(&engine).await, Step::EnteringElevation);
        assert_eq!(pending(&engine).await.start_date, Some(today()));
        assert!(replies[0].text.contains("16.10.2026"));
    }

    #[tokio::test]
    async fn yesterday_resolves_to_previous_date() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        send(&engine, "/newrecord").await;
        send(&engine, "P-1").await;
        send(&engine, "Yesterday").await;

        assert_eq!(
            pending(&engine).await.start_date,
            NaiveDate::from_ymd_opt(2026, 10, 15)
        );
    }

    #[tokio::test]
    async fn other_date_text_reissues_prompt() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        send(&engine, "/newrecord").await;
        send(&engine, "P-1").await;

        let replies = send(&engine, "tomorrow").await;
        assert_eq!(step(&engine).await, Step::SelectingDate);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].labels(), vec!["Today", "Yesterday"]);
    }

    #[tokio::test]
    async fn bad_elevation_is_rejected() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        send(&engine, "/newrecord").await;
        send(&engine, "P-1").await;
        send(&engine, "Today").await;

        let replies = send(&engine, "abc").await;
        assert_eq!(step(&engine).await, Step::EnteringElevation);
        assert_eq!(pending(&engine).await.fact_pile_head, None);
        assert!(replies[0].text.starts_with("Invalid number"));

        send(&engine, "/skip").await;
        assert_eq!(step(&engine).await, Step::EnteringElevation);
    }

    #[tokio::test]
    async fn skipping_operator_leaves_it_empty() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        reach_operator_step(&engine).await;

        send(&engine, "/skip").await;
        assert_eq!(step(&engine).await, Step::EnteringNotes);
        assert_eq!(pending(&engine).await.recorded_by, None);
    }

    #[tokio::test]
    async fn successful_submission_confirms_and_resets() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        reach_operator_step(&engine).await;
        send(&engine, "Kuznetsov").await;

        let replies = send(&engine, "/skip").await;
        assert_eq!(step(&engine).await, Step::Idle);

        let confirmation = &replies[0];
        assert_eq!(confirmation.keyboard, Keyboard::Remove);
        assert!(confirmation.text.contains("P-2"));
        assert!(confirmation.text.contains("16.10.2026"));

        let submitted = engine.backend.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(
            submitted[0],
            PileDrivingRecord {
                project_id: 1,
                pile_number: "P-2".into(),
                pile_field_id: 0,
                start_date: midnight_utc(today()),
                fact_pile_head: 12750,
                recorded_by: "Kuznetsov".into(),
                notes: None,
            }
        );
    }

    #[tokio::test]
    async fn failed_submission_reports_status_and_resets() {
        let engine = engine(
            FakeBackend::with_piles(piles(3)).failing_submit("500 Internal Server Error"),
        );
        send(&engine, "/newrecord").await;
        send(&engine, "P-2").await;
        send(&engine, "Сегодня").await;
        send(&engine, "12750").await;
        send(&engine, "/skip").await;

        let replies = send(&engine, "extra notes").await;
        assert_eq!(step(&engine).await, Step::Idle);
        assert_eq!(
            replies[0].text,
            "Сервер вернул ошибку: 500 Internal Server Error"
        );
        assert_eq!(replies[0].keyboard, Keyboard::Remove);
        assert_eq!(
            engine.backend.submitted()[0].notes.as_deref(),
            Some("extra notes")
        );
    }

    #[tokio::test]
    async fn empty_pile_list_aborts() {
        let engine = engine(FakeBackend::with_piles(vec![]));
        let replies = send(&engine, "/newrecord").await;

        assert_eq!(step(&engine).await, Step::Idle);
        assert_eq!(replies[0].text, "Нет доступных свай для забивки.");
    }

    #[tokio::test]
    async fn unreachable_backend_aborts_with_message() {
        let engine = english(FakeBackend::default());
        let replies = send(&engine, "/newrecord").await;

        assert_eq!(step(&engine).await, Step::Idle);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.contains("connection refused"));
    }

    #[tokio::test]
    async fn restart_discards_progress() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        reach_operator_step(&engine).await;

        send(&engine, "/newrecord").await;
        assert_eq!(step(&engine).await, Step::SelectingPile);
        assert_eq!(pending(&engine).await.fact_pile_head, None);
        assert_eq!(*engine.backend.fetches.lock().unwrap(), vec![1, 1]);
    }

    #[tokio::test]
    async fn help_and_start_never_move_the_dialogue() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        reach_operator_step(&engine).await;

        let replies = send(&engine, "/help").await;
        assert!(replies[0].text.contains("/newrecord"));
        send(&engine, "/start").await;
        assert_eq!(step(&engine).await, Step::EnteringOperator);
        assert_eq!(pending(&engine).await.fact_pile_head, Some(12750));
    }

    #[tokio::test]
    async fn idle_text_gets_guidance() {
        let engine = english(FakeBackend::with_piles(piles(3)));
        let replies = send(&engine, "hello").await;
        assert_eq!(step(&engine).await, Step::Idle);
        assert_eq!(
            replies[0].text,
            "Use /newrecord to start a new record or /help for help."
        );
    }

    #[tokio::test]
    async fn sessions_progress_independently() {
        let engine = Arc::new(english(FakeBackend::with_piles(piles(3))));
        let other = SessionId(7);

        send(&engine, "/newrecord").await;
        engine.handle_on(other, "/newrecord", today()).await;
        engine.handle_on(other, "P-3", today()).await;

        assert_eq!(step(&engine).await, Step::SelectingPile);
        let session = engine.sessions().get(other).await;
        assert_eq!(session.lock().await.state.step(), Step::SelectingDate);
        assert_eq!(engine.sessions().len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_sessions_all_complete() {
        let engine = Arc::new(english(FakeBackend::with_piles(piles(3))));

        let mut handles = Vec::new();
        for chat in 0..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let id = SessionId(chat);
                for text in ["/newrecord", "P-1", "Today", "100", "/skip", "/skip"] {
                    engine.handle_on(id, text, today()).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(engine.backend.submitted().len(), 8);
    }
}
