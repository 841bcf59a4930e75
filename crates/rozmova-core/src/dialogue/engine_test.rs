//! Scenario tests for the dialogue engine and the per-chat dispatcher,
//! driven by scripted mock collaborators.

#[cfg(test)]
mod tests {
    use crate::dialogue::dispatch::Dispatcher;
    use crate::dialogue::engine::DialogueEngine;
    use crate::dialogue::event::{EventKind, InboundEvent};
    use crate::dialogue::state::DialogueState;
    use crate::error::{Result, RozmovaError};
    use crate::menu::QuizTheme;
    use crate::service::{
        AudioBlob, CompletionService, ContentStore, ImageRef, MessagingGateway, Transcript,
        VoiceCodec,
    };
    use crate::session::{ChatId, ChatMessage, Role, SessionStore};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const CHAT: ChatId = 42;

    // ------------------------------------------------------------------
    // Mock collaborators
    // ------------------------------------------------------------------

    struct ScriptedCompletion {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
        delay: Option<Duration>,
    }

    impl ScriptedCompletion {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn last_call(&self) -> Vec<ChatMessage> {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RozmovaError::completion("script exhausted")))
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Text(ChatId, String),
        Buttons(ChatId, String, Vec<String>),
        Image(ChatId),
        Voice(ChatId),
    }

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingGateway {
        fn texts(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|s| match s {
                    Sent::Text(_, text) | Sent::Buttons(_, text, _) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }

        fn last_text(&self) -> String {
            self.texts().last().cloned().unwrap_or_default()
        }

        fn last_buttons(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find_map(|s| match s {
                    Sent::Buttons(_, _, tokens) => Some(tokens.clone()),
                    _ => None,
                })
                .unwrap_or_default()
        }

        fn voice_count(&self) -> usize {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|s| matches!(s, Sent::Voice(_)))
                .count()
        }
    }

    #[async_trait]
    impl MessagingGateway for RecordingGateway {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Text(chat_id, text.to_string()));
            Ok(())
        }

        async fn send_buttons(
            &self,
            chat_id: ChatId,
            text: &str,
            buttons: &[(String, String)],
        ) -> Result<()> {
            let tokens = buttons.iter().map(|(token, _)| token.clone()).collect();
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Buttons(chat_id, text.to_string(), tokens));
            Ok(())
        }

        async fn send_image(&self, chat_id: ChatId, _image: &ImageRef) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Image(chat_id));
            Ok(())
        }

        async fn send_voice(&self, chat_id: ChatId, _audio: &AudioBlob) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Voice(chat_id));
            Ok(())
        }

        async fn next_event(&self) -> Result<InboundEvent> {
            Err(RozmovaError::gateway("not used in tests"))
        }
    }

    struct StubVoice {
        transcript: Mutex<Transcript>,
    }

    impl StubVoice {
        fn saying(text: &str) -> Self {
            Self {
                transcript: Mutex::new(Transcript::Text(text.to_string())),
            }
        }

        fn silent() -> Self {
            Self {
                transcript: Mutex::new(Transcript::NoSpeech),
            }
        }
    }

    #[async_trait]
    impl VoiceCodec for StubVoice {
        async fn transcribe(&self, _audio: &AudioBlob, _hint: &str) -> Result<Transcript> {
            Ok(self.transcript.lock().unwrap().clone())
        }

        async fn synthesize(&self, _text: &str, _hint: &str) -> Result<AudioBlob> {
            Ok(AudioBlob(vec![0xa1]))
        }
    }

    /// Content store with no resources: every key soft-degrades to empty.
    struct EmptyContent;

    #[async_trait]
    impl ContentStore for EmptyContent {
        async fn load_message(&self, _key: &str) -> String {
            String::new()
        }

        async fn load_prompt(&self, _key: &str) -> String {
            String::new()
        }

        async fn load_image(&self, _key: &str) -> Option<ImageRef> {
            None
        }
    }

    // ------------------------------------------------------------------
    // Fixture
    // ------------------------------------------------------------------

    struct TestBot {
        engine: Arc<DialogueEngine>,
        gateway: Arc<RecordingGateway>,
        completion: Arc<ScriptedCompletion>,
    }

    impl TestBot {
        fn store(&self) -> &SessionStore {
            self.engine.store()
        }

        async fn send(&self, kind: EventKind) {
            self.engine
                .handle_event(InboundEvent {
                    chat_id: CHAT,
                    kind,
                })
                .await
                .unwrap();
        }
    }

    fn bot_with(completion: ScriptedCompletion, voice: StubVoice) -> TestBot {
        let completion = Arc::new(completion);
        let gateway = Arc::new(RecordingGateway::default());
        let engine = Arc::new(DialogueEngine::new(
            SessionStore::new(),
            completion.clone(),
            gateway.clone(),
            Arc::new(voice),
            Arc::new(EmptyContent),
        ));
        TestBot {
            engine,
            gateway,
            completion,
        }
    }

    fn bot(replies: Vec<Result<String>>) -> TestBot {
        bot_with(ScriptedCompletion::new(replies), StubVoice::saying("Привіт"))
    }

    fn ok(text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn cmd(name: &str) -> EventKind {
        EventKind::Command(name.to_string())
    }

    fn btn(token: &str) -> EventKind {
        EventKind::ButtonPress(token.to_string())
    }

    fn txt(text: &str) -> EventKind {
        EventKind::Text(text.to_string())
    }

    // ------------------------------------------------------------------
    // Top-level menu and reset
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn start_resets_state_history_and_score() {
        let bot = bot(vec![ok("Привіт!"), ok("Добре")]);
        bot.send(btn("gpt")).await;
        bot.send(txt("Як справи?")).await;
        bot.store().increment_correct(CHAT).await;

        bot.send(cmd("start")).await;

        let session = bot.store().session(CHAT).await;
        assert_eq!(session.state, DialogueState::Main);
        assert!(session.history.is_empty());
        assert_eq!(session.quiz.correct_count, 0);
        // The main menu offers every mode.
        let buttons = bot.gateway.last_buttons();
        assert!(buttons.contains(&"random".to_string()));
        assert!(buttons.contains(&"voicechat".to_string()));
    }

    #[tokio::test]
    async fn unknown_token_keeps_state() {
        let bot = bot(vec![ok("цікавий факт")]);
        bot.send(btn("random")).await;
        assert_eq!(bot.store().state(CHAT).await, DialogueState::Random);

        bot.send(btn("bogus")).await;

        assert_eq!(bot.store().state(CHAT).await, DialogueState::Random);
        assert!(bot.gateway.last_text().contains("Невідома команда"));
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let bot = bot(vec![]);
        bot.send(cmd("stop")).await;
        assert_eq!(bot.store().state(CHAT).await, DialogueState::Ended);

        bot.send(cmd("stop")).await;
        assert_eq!(bot.store().state(CHAT).await, DialogueState::Ended);

        let texts = bot.gateway.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts.iter().all(|t| t.contains("Діалог завершено")));
    }

    #[tokio::test]
    async fn missing_menu_text_still_shows_buttons() {
        // The content store here is empty, so every list falls back to an
        // inline text; the button list must be delivered regardless.
        let bot = bot(vec![]);

        bot.send(btn("quiz")).await;
        assert!(bot.gateway.last_buttons().contains(&"quiz_prog".to_string()));
        assert!(!bot.gateway.last_text().is_empty());

        bot.send(cmd("start")).await;
        bot.send(btn("translater")).await;
        assert!(bot.gateway.last_buttons().contains(&"to_fr".to_string()));
        assert!(!bot.gateway.last_text().is_empty());
    }

    #[tokio::test]
    async fn event_after_termination_starts_fresh() {
        let bot = bot(vec![]);
        bot.send(cmd("stop")).await;

        bot.send(txt("привіт")).await;

        // Treated as a fresh session: back in the menu, text unmatched.
        assert_eq!(bot.store().state(CHAT).await, DialogueState::Main);
    }

    // ------------------------------------------------------------------
    // Open Q&A mode
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn gpt_round_grows_history_by_two() {
        let bot = bot(vec![ok("Привіт!"), ok("У Парижі")]);
        bot.send(btn("gpt")).await;
        let entry_len = bot.store().session(CHAT).await.history.len();

        bot.send(txt("Де Ейфелева вежа?")).await;

        let session = bot.store().session(CHAT).await;
        assert_eq!(session.state, DialogueState::Gpt);
        assert_eq!(session.history.len(), entry_len + 2);
        let roles: Vec<Role> = session.history[entry_len..]
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(bot.gateway.last_text(), "У Парижі");
    }

    #[tokio::test]
    async fn failed_completion_leaves_history_and_state_untouched() {
        let bot = bot(vec![
            ok("Привіт!"),
            Err(RozmovaError::completion("quota exceeded")),
        ]);
        bot.send(btn("gpt")).await;
        let before = bot.store().session(CHAT).await;

        bot.send(txt("Питання")).await;

        let after = bot.store().session(CHAT).await;
        assert_eq!(after.state, before.state);
        assert_eq!(after.history, before.history);
        assert!(bot.gateway.last_text().starts_with("Сталася помилка"));
    }

    #[tokio::test]
    async fn reentering_active_mode_is_a_no_op() {
        let bot = bot(vec![ok("Привіт!")]);
        bot.send(btn("gpt")).await;
        let sent_before = bot.gateway.texts().len();

        bot.send(cmd("gpt")).await;

        assert_eq!(bot.gateway.texts().len(), sent_before);
        assert_eq!(bot.store().state(CHAT).await, DialogueState::Gpt);
    }

    // ------------------------------------------------------------------
    // Persona talk mode
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn persona_selection_seeds_prompt_and_greets() {
        let bot = bot(vec![ok("Доброго дня, я Стівен.")]);
        bot.send(btn("talk")).await;
        assert_eq!(bot.store().state(CHAT).await, DialogueState::TalkChoice);

        bot.send(btn("talk_hawking")).await;

        let session = bot.store().session(CHAT).await;
        assert_eq!(session.state, DialogueState::TalkChat);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, Role::System);
        assert!(bot.gateway.last_text().contains("Ви обрали Стівен Хокінг"));
    }

    #[tokio::test]
    async fn switch_persona_returns_to_the_list() {
        let bot = bot(vec![ok("Привіт від Толкіна")]);
        bot.send(btn("talk")).await;
        bot.send(btn("talk_tolkien")).await;

        bot.send(btn("talk")).await;

        assert_eq!(bot.store().state(CHAT).await, DialogueState::TalkChoice);
        let buttons = bot.gateway.last_buttons();
        assert!(buttons.contains(&"talk_cobain".to_string()));
    }

    // ------------------------------------------------------------------
    // Quiz mode
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn quiz_deduplicates_questions_per_theme() {
        // Scripted: question, answers, duplicate question, fresh question,
        // answers.
        let bot = bot(vec![
            ok("Q1"),
            ok("python, пайтон"),
            ok("Q1"),
            ok("Q2"),
            ok("кортеж"),
        ]);
        bot.send(btn("quiz")).await;
        bot.send(btn("quiz_prog")).await;
        assert_eq!(bot.store().state(CHAT).await, DialogueState::QuizAnswer);
        assert_eq!(bot.gateway.last_text(), "Q1");

        bot.send(txt("python")).await;
        assert_eq!(bot.store().correct_count(CHAT).await, 1);
        assert!(bot.gateway.last_text().contains("Правильно! Рахунок: 1"));

        bot.send(btn("more_btn")).await;

        assert_eq!(bot.gateway.last_text(), "Q2");
        let session = bot.store().session(CHAT).await;
        let asked = &session.quiz.asked[&QuizTheme::Programming];
        assert_eq!(asked.len(), 2);
        assert!(asked.contains("Q1") && asked.contains("Q2"));
        // Two question calls plus one retry plus two answer derivations.
        assert_eq!(bot.completion.call_count(), 5);
    }

    #[tokio::test]
    async fn persistent_duplicate_is_accepted_after_the_retry_cap() {
        // The model keeps returning the same question; after five attempts
        // the possible duplicate is accepted instead of looping forever.
        let bot = bot(vec![
            ok("Q1"),
            ok("python"),
            ok("Q1"),
            ok("Q1"),
            ok("Q1"),
            ok("Q1"),
            ok("Q1"),
            ok("пайтон"),
        ]);
        bot.send(btn("quiz")).await;
        bot.send(btn("quiz_prog")).await;
        bot.send(txt("python")).await;

        bot.send(btn("more_btn")).await;

        assert_eq!(bot.store().state(CHAT).await, DialogueState::QuizAnswer);
        assert_eq!(bot.gateway.last_text(), "Q1");
        // First round (question + answers), five capped attempts, answers.
        assert_eq!(bot.completion.call_count(), 8);
        let session = bot.store().session(CHAT).await;
        assert_eq!(session.quiz.asked[&QuizTheme::Programming].len(), 1);
    }

    #[tokio::test]
    async fn quiz_more_without_theme_asks_to_pick_one() {
        let bot = bot(vec![]);
        bot.send(btn("quiz")).await;

        bot.send(btn("more_btn")).await;

        assert_eq!(bot.store().state(CHAT).await, DialogueState::QuizTheme);
        assert!(bot.gateway.last_text().contains("оберіть тему"));
        assert_eq!(bot.completion.call_count(), 0);
    }

    #[tokio::test]
    async fn quiz_rejects_answers_longer_than_two_words() {
        let bot = bot(vec![ok("Q1"), ok("python")]);
        bot.send(btn("quiz")).await;
        bot.send(btn("quiz_prog")).await;
        let calls_before = bot.completion.call_count();

        bot.send(txt("одне два три")).await;

        assert_eq!(bot.store().state(CHAT).await, DialogueState::QuizAnswer);
        assert!(bot.gateway.last_text().contains("не більше двох слів"));
        // Rejected locally, no upstream call.
        assert_eq!(bot.completion.call_count(), calls_before);
    }

    #[tokio::test]
    async fn wrong_answer_reveals_the_expected_one() {
        let bot = bot(vec![ok("Q1"), ok("кит")]);
        bot.send(btn("quiz")).await;
        bot.send(btn("quiz_bio")).await;

        bot.send(txt("слон")).await;

        assert_eq!(bot.store().correct_count(CHAT).await, 0);
        let text = bot.gateway.last_text();
        assert!(text.contains("Неправильно"));
        assert!(text.contains("кит"));
        assert_eq!(bot.store().state(CHAT).await, DialogueState::QuizTheme);
    }

    #[tokio::test]
    async fn score_survives_theme_switch_but_not_menu_exit() {
        let bot = bot(vec![ok("Q1"), ok("кит"), ok("Q2"), ok("сім")]);
        bot.send(btn("quiz")).await;
        bot.send(btn("quiz_bio")).await;
        bot.send(txt("кит")).await;
        assert_eq!(bot.store().correct_count(CHAT).await, 1);

        bot.send(btn("quiz_math")).await;
        bot.send(txt("сім")).await;
        assert_eq!(bot.store().correct_count(CHAT).await, 2);

        bot.send(btn("end_btn")).await;
        assert_eq!(bot.store().correct_count(CHAT).await, 0);
        assert_eq!(bot.store().state(CHAT).await, DialogueState::Main);
    }

    // ------------------------------------------------------------------
    // Translation mode
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn translation_embeds_target_language_and_metadata() {
        let bot = bot(vec![ok("bonjour")]);
        bot.send(btn("translater")).await;
        assert_eq!(
            bot.store().state(CHAT).await,
            DialogueState::TranslateChoice
        );

        bot.send(btn("to_fr")).await;
        assert_eq!(bot.store().state(CHAT).await, DialogueState::TranslateInput);
        assert_eq!(
            bot.store().translate_target(CHAT).await.unwrap().label(),
            "Французька"
        );

        bot.send(txt("hello")).await;

        let call = bot.completion.last_call();
        assert!(call.iter().any(|m| m.content.contains("Французька")));
        let text = bot.gateway.last_text();
        assert!(text.contains("bonjour"));
        assert!(text.contains("Мова перекладу: Французька"));
        assert!(text.contains("Оригінал: hello"));
        assert_eq!(
            bot.store().state(CHAT).await,
            DialogueState::TranslateChoice
        );
    }

    // ------------------------------------------------------------------
    // Voice-chat mode
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn voice_round_replies_with_audio() {
        let bot = bot_with(
            ScriptedCompletion::new(vec![ok("Вітаю!")]),
            StubVoice::saying("Привіт"),
        );
        bot.send(btn("voicechat")).await;
        assert_eq!(bot.store().state(CHAT).await, DialogueState::VoiceChat);

        bot.send(EventKind::Voice(AudioBlob(vec![1, 2, 3]))).await;

        assert_eq!(bot.gateway.voice_count(), 1);
        let session = bot.store().session(CHAT).await;
        assert_eq!(session.state, DialogueState::VoiceChat);
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn no_speech_keeps_voice_mode_for_retry() {
        let bot = bot_with(ScriptedCompletion::new(vec![]), StubVoice::silent());
        bot.send(btn("voicechat")).await;

        bot.send(EventKind::Voice(AudioBlob(vec![9]))).await;

        assert_eq!(bot.store().state(CHAT).await, DialogueState::VoiceChat);
        assert!(bot.gateway.last_text().contains("розпізнати"));
        assert_eq!(bot.completion.call_count(), 0);
    }

    // ------------------------------------------------------------------
    // Upstream timeout
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn hung_completion_surfaces_as_a_readable_failure() {
        let bot = bot_with(
            ScriptedCompletion::new(vec![ok("Привіт!")])
                .with_delay(Duration::from_secs(120)),
            StubVoice::saying("x"),
        );

        bot.send(btn("gpt")).await;

        let text = bot.gateway.last_text();
        assert!(text.starts_with("Сталася помилка"));
        assert!(text.contains("час очікування"));
        // The failed entry leaves the session untouched.
        let session = bot.store().session(CHAT).await;
        assert_eq!(session.state, DialogueState::Main);
        assert!(session.history.is_empty());
    }

    // ------------------------------------------------------------------
    // Dispatcher
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn dispatcher_serializes_events_within_a_chat() {
        let bot = bot_with(
            ScriptedCompletion::new(vec![ok("Привіт!"), ok("перша"), ok("друга")])
                .with_delay(Duration::from_millis(20)),
            StubVoice::saying("x"),
        );
        bot.send(btn("gpt")).await;

        let dispatcher = Dispatcher::new(bot.engine.clone());
        dispatcher
            .dispatch(InboundEvent {
                chat_id: CHAT,
                kind: txt("один"),
            })
            .await;
        dispatcher
            .dispatch(InboundEvent {
                chat_id: CHAT,
                kind: txt("два"),
            })
            .await;

        tokio::time::sleep(Duration::from_millis(200)).await;

        let texts = bot.gateway.texts();
        let first = texts.iter().position(|t| t == "перша").unwrap();
        let second = texts.iter().position(|t| t == "друга").unwrap();
        assert!(first < second);
        assert_eq!(bot.store().session(CHAT).await.history.len(), 6);
    }

    #[tokio::test]
    async fn cancel_bypasses_the_queue_while_a_call_is_in_flight() {
        let bot = bot_with(
            ScriptedCompletion::new(vec![ok("Привіт!"), ok("запізніла відповідь")])
                .with_delay(Duration::from_millis(150)),
            StubVoice::saying("x"),
        );
        bot.send(btn("gpt")).await;

        let dispatcher = Dispatcher::new(bot.engine.clone());
        dispatcher
            .dispatch(InboundEvent {
                chat_id: CHAT,
                kind: txt("довге питання"),
            })
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        dispatcher
            .dispatch(InboundEvent {
                chat_id: CHAT,
                kind: cmd("stop"),
            })
            .await;

        // The session is already terminated while the completion call is
        // still in flight.
        assert_eq!(bot.store().state(CHAT).await, DialogueState::Ended);

        tokio::time::sleep(Duration::from_millis(400)).await;

        // The late reply was still delivered, but its history writes and
        // state commit were dropped.
        assert!(
            bot.gateway
                .texts()
                .iter()
                .any(|t| t == "запізніла відповідь")
        );
        let session = bot.store().session(CHAT).await;
        assert_eq!(session.state, DialogueState::Ended);
        assert!(session.history.is_empty());
    }
}
