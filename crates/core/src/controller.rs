use tracing::{debug, warn};

use crate::{
    error::{Result, YtBuddyError},
    gateway::{BackendGateway, HealthStatus},
    persistence::StatePort,
    player::{PlayerAdapter, PlayerEmbed, PlayerStatus},
    store::{SessionStore, SessionToken},
    types::{ChatMessage, Mode, Session, Tab},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Analysis,
    /// A session exists but carries no transcript, summary or key points.
    NoAnalysisData,
}

/// An analyze request that has been issued but not yet applied.
#[derive(Debug)]
pub struct PendingAnalysis {
    url: String,
    started_under: Option<SessionToken>,
}

impl PendingAnalysis {
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A question whose user message is already in the chat and whose answer is
/// still outstanding.
#[derive(Debug)]
pub struct PendingQuestion {
    token: SessionToken,
    video_id: String,
    question: String,
    mode: Mode,
}

impl PendingQuestion {
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Composes the session store, backend gateway and player into the
/// interactive analysis screen.
pub struct AnalysisController<G, P, E>
where
    G: BackendGateway,
    P: StatePort,
    E: PlayerEmbed,
{
    gateway: G,
    store: SessionStore<P>,
    player: PlayerAdapter<E>,
    tab: Tab,
    mode: Mode,
}

impl<G, P, E> AnalysisController<G, P, E>
where
    G: BackendGateway,
    P: StatePort,
    E: PlayerEmbed,
{
    pub fn new(gateway: G, store: SessionStore<P>, player: PlayerAdapter<E>) -> Self {
        Self {
            gateway,
            store,
            player,
            tab: Tab::default(),
            mode: Mode::default(),
        }
    }

    /// Resume from the persisted slot, loading the player when the restored
    /// session has something to show.
    pub async fn open(&mut self) -> Screen {
        self.restore();
        self.sync_player().await;
        self.screen()
    }

    /// Resume from the persisted slot without touching the player.
    pub fn restore(&mut self) -> Screen {
        self.store.restore_from_persisted();
        self.tab = Tab::default();
        self.screen()
    }

    pub fn screen(&self) -> Screen {
        match self.store.session() {
            None => Screen::Landing,
            Some(session) if session.has_analysis() => Screen::Analysis,
            Some(_) => Screen::NoAnalysisData,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.store.session()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        self.store.chat()
    }

    pub fn player_status(&self) -> &PlayerStatus {
        self.player.status()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn select_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn begin_analysis(&self, url: &str) -> Result<PendingAnalysis> {
        let url = url.trim();
        if url.is_empty() {
            return Err(YtBuddyError::EmptyUrl);
        }
        Ok(PendingAnalysis {
            url: url.to_string(),
            started_under: self.store.token(),
        })
    }

    /// Apply an analyze result. Returns `Ok(false)` when the session changed
    /// while the request was in flight and the result was dropped.
    pub fn complete_analysis(
        &mut self,
        pending: PendingAnalysis,
        result: Result<Session>,
    ) -> Result<bool> {
        if self.store.token() != pending.started_under {
            debug!(url = %pending.url, "discarding analysis for a superseded session");
            return Ok(false);
        }

        let session = result?;
        self.store.start_session(session)?;
        self.tab = Tab::default();
        Ok(true)
    }

    /// Landing flow: analyze `url` and make it the active session.
    pub async fn submit_url(&mut self, url: &str) -> Result<Screen> {
        let pending = self.begin_analysis(url)?;
        let result = self.gateway.analyze(pending.url()).await;
        if self.complete_analysis(pending, result)? {
            self.sync_player().await;
        }
        Ok(self.screen())
    }

    /// Optimistically append the user's message. Returns `None` for blank
    /// input or outside the analysis screen; nothing is recorded then.
    pub fn begin_question(&mut self, input: &str) -> Option<PendingQuestion> {
        let question = input.trim();
        if question.is_empty() || self.screen() != Screen::Analysis {
            return None;
        }
        let token = self.store.token()?;
        let video_id = self.store.video_id()?.to_string();

        self.store
            .append_chat_messages(token, [ChatMessage::user(question, self.mode)]);

        Some(PendingQuestion {
            token,
            video_id,
            question: question.to_string(),
            mode: self.mode,
        })
    }

    /// Append the answer fragments, or a single apology on failure. Returns
    /// `false` when the session changed and the answer was dropped.
    pub fn complete_question(
        &mut self,
        pending: PendingQuestion,
        result: Result<Vec<ChatMessage>>,
    ) -> bool {
        let fragments = match result {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(error = %e, video_id = %pending.video_id, "question failed");
                vec![ChatMessage::apology()]
            }
        };
        self.store.append_chat_messages(pending.token, fragments)
    }

    /// Ask `input` about the active video and return the messages it added.
    pub async fn ask(&mut self, input: &str) -> &[ChatMessage] {
        let start = self.store.chat().len();
        if let Some(pending) = self.begin_question(input) {
            let result = self
                .gateway
                .ask(pending.video_id(), pending.question(), pending.mode())
                .await;
            self.complete_question(pending, result);
        }
        self.store.chat().get(start..).unwrap_or(&[])
    }

    /// Leave the analysis screen: clears the session and releases the player.
    pub fn go_back(&mut self) {
        self.store.end_session();
        self.player.dispose();
        self.tab = Tab::default();
    }

    pub async fn health(&self) -> HealthStatus {
        self.gateway.health().await
    }

    async fn sync_player(&mut self) {
        match self.screen() {
            Screen::Analysis => {
                let video_id = self.store.video_id().unwrap_or_default().to_string();
                self.player.load(&video_id).await;
            }
            Screen::Landing | Screen::NoAnalysisData => self.player.dispose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        normalize::answer_fragments,
        persistence::{MemoryStatePort, PersistedState},
        player::{PlayerPhase, tests::RecordingEmbed},
        types::{APOLOGY, GREETING, Role},
    };

    #[derive(Default)]
    struct FakeGateway {
        session: Option<Session>,
        answers: Mutex<VecDeque<Result<Vec<ChatMessage>>>>,
        asked: Mutex<Vec<(String, String, Mode)>>,
    }

    impl FakeGateway {
        fn analyzing(session: Session) -> Self {
            Self {
                session: Some(session),
                ..Default::default()
            }
        }

        fn answer(&self, result: Result<Vec<ChatMessage>>) {
            self.answers.lock().unwrap().push_back(result);
        }

        fn asked(&self) -> Vec<(String, String, Mode)> {
            self.asked.lock().unwrap().clone()
        }
    }

    impl BackendGateway for Arc<FakeGateway> {
        async fn analyze(&self, _url: &str) -> Result<Session> {
            self.session.clone().ok_or_else(|| YtBuddyError::AnalysisFailed {
                reason: "Internal Server Error".into(),
            })
        }

        async fn ask(&self, video_id: &str, question: &str, mode: Mode) -> Result<Vec<ChatMessage>> {
            self.asked
                .lock()
                .unwrap()
                .push((video_id.into(), question.into(), mode));
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(answer_fragments(&json!({ "answer": "ok" }))))
        }

        async fn health(&self) -> HealthStatus {
            HealthStatus {
                reachable: true,
                status: Some("ok".into()),
                payload: None,
            }
        }
    }

    type TestController =
        AnalysisController<Arc<FakeGateway>, Arc<MemoryStatePort>, Arc<RecordingEmbed>>;

    struct Harness {
        controller: TestController,
        gateway: Arc<FakeGateway>,
        port: Arc<MemoryStatePort>,
        embed: Arc<RecordingEmbed>,
    }

    fn harness(gateway: FakeGateway, port: MemoryStatePort) -> Harness {
        let gateway = Arc::new(gateway);
        let port = Arc::new(port);
        let embed = Arc::new(RecordingEmbed::default());
        let controller = AnalysisController::new(
            gateway.clone(),
            SessionStore::new(port.clone()),
            PlayerAdapter::new(embed.clone()),
        );
        Harness {
            controller,
            gateway,
            port,
            embed,
        }
    }

    fn abc123() -> Session {
        Session {
            video_id: "abc123".into(),
            transcript: "T".into(),
            summary: "S".into(),
            key_points: vec!["a".into(), "b".into()],
            language: None,
        }
    }

    fn assistant_count(chat: &[ChatMessage]) -> usize {
        chat.iter().filter(|m| m.role == Role::Assistant).count()
    }

    #[tokio::test]
    async fn submit_url_enters_analysis_screen() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        assert_eq!(h.controller.open().await, Screen::Landing);

        let screen = h.controller.submit_url("https://youtu.be/abc123").await.unwrap();

        assert_eq!(screen, Screen::Analysis);
        assert_eq!(h.controller.session(), Some(&abc123()));
        assert_eq!(h.controller.chat().len(), 1);
        assert_eq!(h.controller.chat()[0].text, GREETING);
        assert_eq!(h.controller.player_status().phase, PlayerPhase::Ready);
        assert_eq!(h.port.load().unwrap(), Some(PersistedState::new(abc123())));
    }

    #[tokio::test]
    async fn failed_analysis_stays_on_landing() {
        let mut h = harness(FakeGateway::default(), MemoryStatePort::new());
        let err = h.controller.submit_url("https://youtu.be/abc123").await.unwrap_err();

        assert!(matches!(err, YtBuddyError::AnalysisFailed { .. }));
        assert_eq!(h.controller.screen(), Screen::Landing);
        assert_eq!(h.port.raw(), None);
    }

    #[tokio::test]
    async fn open_resumes_persisted_session() {
        let port = MemoryStatePort::new();
        port.save(&PersistedState::new(abc123())).unwrap();
        let mut h = harness(FakeGateway::default(), port);

        assert_eq!(h.controller.open().await, Screen::Analysis);
        assert_eq!(h.controller.session(), Some(&abc123()));
        assert_eq!(*h.embed.loads.lock().unwrap(), vec!["abc123"]);
    }

    #[test]
    fn restore_leaves_player_untouched() {
        let port = MemoryStatePort::new();
        port.save(&PersistedState::new(abc123())).unwrap();
        let mut h = harness(FakeGateway::default(), port);

        assert_eq!(h.controller.restore(), Screen::Analysis);
        assert_eq!(h.controller.session(), Some(&abc123()));
        assert_eq!(h.controller.player_status().phase, PlayerPhase::Uninitialized);
        assert!(h.embed.loads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_session_renders_no_data_screen() {
        let empty = Session {
            video_id: "abc123".into(),
            ..Default::default()
        };
        let mut h = harness(FakeGateway::analyzing(empty), MemoryStatePort::new());

        let screen = h.controller.submit_url("https://youtu.be/abc123").await.unwrap();
        assert_eq!(screen, Screen::NoAnalysisData);
        assert!(h.embed.loads.lock().unwrap().is_empty());

        assert!(h.controller.ask("hello").await.is_empty());
        assert_eq!(h.controller.chat().len(), 1);
        assert!(h.gateway.asked().is_empty());

        h.controller.go_back();
        assert_eq!(h.controller.screen(), Screen::Landing);
        assert_eq!(h.port.raw(), None);
    }

    #[tokio::test]
    async fn beyond_question_appends_user_then_two_fragments() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        h.controller.submit_url("https://youtu.be/abc123").await.unwrap();
        h.controller.select_mode(Mode::Beyond);
        h.gateway.answer(Ok(answer_fragments(&json!({
            "type": "beyond",
            "transcript_answer": "It's about X",
            "general_answer": "X is generally Y",
        }))));

        let added: Vec<_> = h
            .controller
            .ask("what is this about")
            .await
            .iter()
            .map(|m| (m.role, m.text.clone(), m.mode))
            .collect();

        assert_eq!(
            added,
            vec![
                (Role::User, "what is this about".to_string(), Some(Mode::Beyond)),
                (Role::Assistant, "It's about X".to_string(), Some(Mode::Default)),
                (Role::Assistant, "X is generally Y".to_string(), Some(Mode::Beyond)),
            ]
        );
        assert_eq!(
            h.gateway.asked(),
            vec![("abc123".to_string(), "what is this about".to_string(), Mode::Beyond)]
        );
    }

    #[tokio::test]
    async fn failed_question_appends_single_apology() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        h.controller.submit_url("https://youtu.be/abc123").await.unwrap();
        h.controller.select_mode(Mode::Beyond);
        h.gateway.answer(Err(YtBuddyError::QuestionFailed {
            reason: "Internal Server Error".into(),
        }));

        let before = assistant_count(h.controller.chat());
        let added = h.controller.ask("why?").await.to_vec();

        assert_eq!(added.len(), 2);
        assert_eq!(added[1].text, APOLOGY);
        assert_eq!(assistant_count(h.controller.chat()), before + 1);
    }

    #[tokio::test]
    async fn blank_question_is_ignored() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        h.controller.submit_url("https://youtu.be/abc123").await.unwrap();

        assert!(h.controller.ask("   ").await.is_empty());
        assert_eq!(h.controller.chat().len(), 1);
        assert!(h.gateway.asked().is_empty());
    }

    #[tokio::test]
    async fn question_without_session_is_ignored() {
        let mut h = harness(FakeGateway::default(), MemoryStatePort::new());
        assert!(h.controller.ask("hello").await.is_empty());
        assert!(h.gateway.asked().is_empty());
    }

    #[tokio::test]
    async fn concurrent_answers_append_in_arrival_order() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        h.controller.submit_url("https://youtu.be/abc123").await.unwrap();

        let first = h.controller.begin_question("first?").unwrap();
        let second = h.controller.begin_question("second?").unwrap();

        assert!(h.controller.complete_question(
            second,
            Ok(vec![ChatMessage::assistant("answer two", Mode::Default)])
        ));
        assert!(h.controller.complete_question(
            first,
            Ok(vec![ChatMessage::assistant("answer one", Mode::Default)])
        ));

        let texts: Vec<_> = h.controller.chat().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![GREETING, "first?", "second?", "answer two", "answer one"]
        );
    }

    #[tokio::test]
    async fn answer_after_session_change_is_dropped() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        h.controller.submit_url("https://youtu.be/abc123").await.unwrap();
        let pending = h.controller.begin_question("still there?").unwrap();

        h.controller.go_back();
        assert!(!h.controller.complete_question(
            pending,
            Ok(vec![ChatMessage::assistant("late", Mode::Default)])
        ));
        assert!(h.controller.chat().is_empty());
        assert_eq!(h.embed.destroyed(), vec!["abc123"]);
    }

    #[tokio::test]
    async fn analysis_after_session_change_is_dropped() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        let pending = h.controller.begin_analysis("https://youtu.be/other").unwrap();

        h.controller.submit_url("https://youtu.be/abc123").await.unwrap();
        let applied = h
            .controller
            .complete_analysis(
                pending,
                Ok(Session {
                    video_id: "other".into(),
                    summary: "late".into(),
                    ..Default::default()
                }),
            )
            .unwrap();

        assert!(!applied);
        assert_eq!(h.controller.session(), Some(&abc123()));
    }

    #[tokio::test]
    async fn tab_resets_on_new_session() {
        let mut h = harness(FakeGateway::analyzing(abc123()), MemoryStatePort::new());
        h.controller.select_tab(Tab::KeyPoints);
        h.controller.submit_url("https://youtu.be/abc123").await.unwrap();
        assert_eq!(h.controller.tab(), Tab::Summary);

        h.controller.select_tab(Tab::KeyPoints);
        assert_eq!(h.controller.tab(), Tab::KeyPoints);
        assert!(h.controller.health().await.reachable);
    }
}
