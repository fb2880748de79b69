use crate::config::prompt::{ self, PromptConfig };
use crate::conversation::ConversationState;
use crate::interpreter::{ self, render };
use crate::llm::chat::QueryClient;
use crate::models::chat::Message;

use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pacing delay before the typing indicator is shown.
    pub typing_delay: Duration,
    /// Pacing delay before a staged history entry is committed.
    pub history_commit_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_delay: Duration::from_millis(300),
            history_commit_delay: Duration::from_millis(800),
        }
    }
}

/// Drives one conversation thread: user submissions in, bot messages and
/// follow-up suggestions out.
pub struct ChatSession {
    client: Arc<dyn QueryClient>,
    prompts: Arc<PromptConfig>,
    state: Arc<Mutex<ConversationState>>,
    config: SessionConfig,
    suggestion_task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    pub fn new(
        client: Arc<dyn QueryClient>,
        prompts: Arc<PromptConfig>,
        config: SessionConfig
    ) -> Self {
        Self {
            client,
            prompts,
            state: Arc::new(Mutex::new(ConversationState::new())),
            config,
            suggestion_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> Arc<Mutex<ConversationState>> {
        Arc::clone(&self.state)
    }

    /// Submit a user query and drive it to a bot message. A failed remote
    /// call becomes an inline HTML error fragment; this never returns an
    /// error. Returns the appended bot message, or None when a newer
    /// submission superseded this one before it completed.
    pub async fn submit_query(&self, query: &str) -> Option<Message> {
        let (seq, staged) = {
            let mut state = self.state.lock().await;
            state.begin_query(query)
        };

        if staged {
            let state = Arc::clone(&self.state);
            let text = query.to_string();
            let delay = self.config.history_commit_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                state.lock().await.commit_pending_history(&text);
            });
        }

        {
            let state = Arc::clone(&self.state);
            let delay = self.config.typing_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                state.lock().await.insert_typing(seq);
            });
        }

        let answer_prompt = prompt::get_answer_prompt(&self.prompts, query);
        let html = match self.client.ask(&answer_prompt, false).await {
            Ok(raw) => render::to_html(&interpreter::interpret(&raw)),
            Err(e) => {
                warn!("Remote query failed, substituting error fragment: {}", e);
                render::error_fragment(&e.to_string())
            }
        };

        let appended = {
            let mut state = self.state.lock().await;
            state.complete_query(seq, html)
        };

        // The suggestion request trails the bot message and never blocks it.
        let handle = self.spawn_suggestion_fetch(query.to_string(), seq);
        *self.suggestion_task.lock().await = Some(handle);

        appended
    }

    fn spawn_suggestion_fetch(&self, query: String, seq: u64) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let prompts = Arc::clone(&self.prompts);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let list = fetch_suggestions(client.as_ref(), &prompts, &query).await;
            state.lock().await.set_suggestions(seq, list);
        })
    }

    /// Wait for the most recently spawned suggestion request to settle.
    pub async fn wait_for_suggestions(&self) {
        let handle = self.suggestion_task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub async fn new_chat(&self) {
        self.state.lock().await.new_chat();
    }

    pub async fn delete_history(&self, text: &str) -> bool {
        self.state.lock().await.delete_history(text)
    }
}

/// Fetch up to three follow-up questions for a query. Any failure, remote or
/// parse, degrades to an empty list and is never surfaced to the user.
pub async fn fetch_suggestions(
    client: &dyn QueryClient,
    prompts: &PromptConfig,
    query: &str
) -> Vec<String> {
    let suggestion_prompt = prompt::get_suggestion_prompt(prompts, query);
    let raw = match client.ask(&suggestion_prompt, true).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Suggestion request failed: {}", e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(list) => list,
        Err(e) => {
            warn!("Failed to parse suggestions: {} ({})", e, raw);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::RemoteCallError;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct ScriptedClient {
        replies: StdMutex<Vec<Result<String, RemoteCallError>>>,
        reply_delay: Duration,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, RemoteCallError>>) -> Self {
            Self {
                replies: StdMutex::new(replies),
                reply_delay: Duration::from_millis(0),
            }
        }
    }

    #[async_trait]
    impl QueryClient for ScriptedClient {
        async fn ask(
            &self,
            _prompt: &str,
            _structured_json: bool
        ) -> Result<String, RemoteCallError> {
            if !self.reply_delay.is_zero() {
                tokio::time::sleep(self.reply_delay).await;
            }
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn session_with(client: ScriptedClient, config: SessionConfig) -> ChatSession {
        ChatSession::new(
            Arc::new(client),
            Arc::new(PromptConfig::default()),
            config
        )
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            typing_delay: Duration::from_millis(1),
            history_commit_delay: Duration::from_millis(1),
        }
    }

    fn status_error() -> RemoteCallError {
        RemoteCallError::Status {
            status: 500,
            body: "internal".to_string(),
        }
    }

    #[tokio::test]
    async fn chart_response_renders_bar_chart_and_suggestions_follow() {
        let chart_reply = "<p>Here is the chart:</p>\n```chart\n{\"type\": \"bar\", \"data\": {\"labels\": [\"Q1\"]}, \"options\": {}}\n```";
        let suggestion_reply =
            r#"["What about Q3?", "Compare regions", "Show raw data"]"#;
        let session = session_with(
            ScriptedClient::new(
                vec![Ok(chart_reply.to_string()), Ok(suggestion_reply.to_string())]
            ),
            fast_config()
        );

        let appended = session.submit_query("Show NPL trend").await;
        match appended {
            Some(Message::Bot { html, .. }) => {
                assert!(html.contains("data-chart-type=\"bar\""));
            }
            other => panic!("expected bot message, got {:?}", other),
        }

        session.wait_for_suggestions().await;
        let state = session.state();
        let state = state.lock().await;
        assert_eq!(
            state.suggestions(),
            ["What about Q3?", "Compare regions", "Show raw data"]
        );
    }

    #[tokio::test]
    async fn failed_remote_call_yields_exactly_one_error_fragment() {
        let session = session_with(
            ScriptedClient::new(vec![Err(status_error()), Ok("[]".to_string())]),
            fast_config()
        );

        let appended = session.submit_query("Show NPL trend").await;
        let html = match appended {
            Some(Message::Bot { html, .. }) => html,
            other => panic!("expected bot message, got {:?}", other),
        };
        assert!(html.contains("Error"));
        assert!(html.contains("500"));

        session.wait_for_suggestions().await;
        let state = session.state();
        let state = state.lock().await;
        let bots = state
            .messages()
            .iter()
            .filter(|m| matches!(m, Message::Bot { .. }))
            .count();
        assert_eq!(bots, 1);
        assert!(!state.messages().iter().any(|m| m.is_typing()));
    }

    #[tokio::test]
    async fn failed_suggestion_request_leaves_an_empty_list() {
        let session = session_with(
            ScriptedClient::new(
                vec![Ok("plain answer".to_string()), Err(status_error())]
            ),
            fast_config()
        );

        session.submit_query("anything").await;
        session.wait_for_suggestions().await;
        let state = session.state();
        let state = state.lock().await;
        assert!(state.suggestions().is_empty());
    }

    #[tokio::test]
    async fn unparseable_suggestions_degrade_to_empty_list() {
        let session = session_with(
            ScriptedClient::new(
                vec![
                    Ok("answer".to_string()),
                    Ok("not a json array".to_string())
                ]
            ),
            fast_config()
        );

        session.submit_query("anything").await;
        session.wait_for_suggestions().await;
        let state = session.state();
        let state = state.lock().await;
        assert!(state.suggestions().is_empty());
    }

    #[tokio::test]
    async fn typing_placeholder_appears_while_awaiting_and_clears_after() {
        let mut client = ScriptedClient::new(
            vec![Ok("slow answer".to_string()), Ok("[]".to_string())]
        );
        client.reply_delay = Duration::from_millis(80);
        let session = Arc::new(session_with(client, fast_config()));

        let submitting = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session.submit_query("query").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(40)).await;
        {
            let state = session.state();
            let state = state.lock().await;
            assert!(state.messages().iter().any(|m| m.is_typing()));
        }

        submitting.await.unwrap();
        let state = session.state();
        let state = state.lock().await;
        assert!(!state.messages().iter().any(|m| m.is_typing()));
    }

    #[tokio::test]
    async fn staged_history_entry_commits_after_the_delay() {
        let session = session_with(
            ScriptedClient::new(
                vec![Ok("answer".to_string()), Ok("[]".to_string())]
            ),
            fast_config()
        );

        session.submit_query("fresh question").await;
        session.wait_for_suggestions().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let state = session.state();
        let state = state.lock().await;
        assert_eq!(state.history().entries(), ["fresh question"]);
        assert_eq!(state.history().pending(), None);
        assert_eq!(state.history().active(), Some("fresh question"));
    }

    #[tokio::test]
    async fn reopened_history_item_is_not_staged_again() {
        let session = session_with(
            ScriptedClient::new(
                vec![
                    Ok("first answer".to_string()),
                    Ok("[]".to_string()),
                    Ok("second answer".to_string()),
                    Ok("[]".to_string())
                ]
            ),
            fast_config()
        );

        session.submit_query("the question").await;
        session.wait_for_suggestions().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.new_chat().await;

        session.submit_query("the question").await;
        session.wait_for_suggestions().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let state = session.state();
        let state = state.lock().await;
        assert_eq!(state.history().entries(), ["the question"]);
    }
}
