//! One chat conversation: the session store plus the work in flight for it.
//!
//! `Chat` is the only writer of its [`ChatSession`]. Questions are sent from a
//! spawned task that merely returns the reply; the owner of `Chat` drives
//! progress with [`Chat::advance`] (usually from a `tokio::select!` loop), and
//! every store mutation happens there.

use std::future;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::backend::{AskClient, DispatchError};
use crate::normalize::display_text;
use crate::session::{ChatSession, MessageId};
use crate::typewriter::{Typewriter, DEFAULT_WORD_DELAY};

pub const DEFAULT_WELCOME: &str =
    "Hello! I'm your RapidScale AI assistant. How can I help you today?";

pub type ErrorHook = Box<dyn Fn(&DispatchError) + Send + Sync>;

type Dispatch = JoinHandle<Result<Value, DispatchError>>;

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub welcome_message: String,
    pub typing_delay: Duration,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME.to_string(),
            typing_delay: DEFAULT_WORD_DELAY,
        }
    }
}

/// What changed after a call to [`Chat::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatUpdate {
    /// A reply arrived; its (still empty) message is now being revealed.
    Answered(MessageId),
    /// The request failed and the error message was appended.
    Failed(MessageId),
    /// One more word of the message is visible.
    Revealed(MessageId),
    /// The message is fully revealed.
    Finished(MessageId),
}

struct Reveal {
    id: MessageId,
    typewriter: Typewriter,
}

enum Step {
    Dispatched(Result<Value, DispatchError>),
    Frame(Option<String>),
}

pub struct Chat {
    session: ChatSession,
    client: AskClient,
    options: ChatOptions,
    in_flight: Option<Dispatch>,
    reveal: Option<Reveal>,
    on_error: Option<ErrorHook>,
}

impl Chat {
    pub fn new(client: AskClient, options: ChatOptions) -> Self {
        Self {
            session: ChatSession::with_welcome(&options.welcome_message),
            client,
            options,
            in_flight: None,
            reveal: None,
            on_error: None,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn client(&self) -> &AskClient {
        &self.client
    }

    /// Called with every failed request, after it has been logged.
    pub fn set_error_hook(&mut self, hook: impl Fn(&DispatchError) + Send + Sync + 'static) {
        self.on_error = Some(Box::new(hook));
    }

    /// Record the user's text and send it. Returns `false` when the store
    /// rejected it (blank text or a request already pending).
    pub fn submit(&mut self, text: &str) -> bool {
        let Some(id) = self.session.append_user_message(text) else {
            return false;
        };
        let question = self
            .session
            .message(id)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        tracing::debug!(message = id.as_u64(), endpoint = self.client.endpoint(), "sending question");
        let client = self.client.clone();
        self.in_flight = Some(tokio::spawn(async move { client.ask(&question).await }));
        true
    }

    /// True while a request is outstanding or a reply is being revealed.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.reveal.is_some()
    }

    /// Wait for the next piece of progress and apply it to the session.
    /// Returns `None` right away when there is nothing to wait for.
    ///
    /// Cancel-safe: dropping the future loses no reply and no word.
    pub async fn advance(&mut self) -> Option<ChatUpdate> {
        if !self.is_busy() {
            return None;
        }

        let step = tokio::select! {
            biased;
            joined = wait_dispatch(&mut self.in_flight) => Step::Dispatched(joined),
            frame = wait_frame(&mut self.reveal) => Step::Frame(frame),
        };

        match step {
            Step::Dispatched(result) => {
                self.in_flight = None;
                Some(self.apply_reply(result))
            }
            Step::Frame(frame) => self.apply_frame(frame),
        }
    }

    /// Drive the conversation until nothing is in flight.
    pub async fn run_until_idle(&mut self) {
        while self.advance().await.is_some() {}
    }

    pub fn select(&mut self, id: Option<MessageId>) -> bool {
        self.session.select(id)
    }

    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    /// Abort the outstanding request and abandon the running reveal.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.reveal = None;
        self.session.set_animating(None);
    }

    fn apply_reply(&mut self, result: Result<Value, DispatchError>) -> ChatUpdate {
        // Only the newest assistant message may be animating.
        self.flush_reveal();

        match result {
            Ok(payload) => {
                let text = display_text(&payload);
                let id = self.session.append_assistant_message(Some(payload));
                self.session.set_animating(Some(id));
                self.reveal = Some(Reveal {
                    id,
                    typewriter: Typewriter::new(&text, self.options.typing_delay),
                });
                tracing::debug!(message = id.as_u64(), chars = text.len(), "reply received");
                ChatUpdate::Answered(id)
            }
            Err(err) => {
                tracing::error!(error = %err, endpoint = self.client.endpoint(), "request failed");
                if let Some(hook) = &self.on_error {
                    hook(&err);
                }
                let id = self.session.append_error_message(&self.failure_text());
                ChatUpdate::Failed(id)
            }
        }
    }

    fn apply_frame(&mut self, frame: Option<String>) -> Option<ChatUpdate> {
        let reveal = self.reveal.as_ref()?;
        let id = reveal.id;

        if let Some(text) = frame {
            self.session.update_message_content(id, &text);
        }

        if reveal.typewriter.is_done() {
            self.reveal = None;
            self.session.set_animating(None);
            Some(ChatUpdate::Finished(id))
        } else {
            Some(ChatUpdate::Revealed(id))
        }
    }

    fn flush_reveal(&mut self) {
        if let Some(mut reveal) = self.reveal.take() {
            let text = reveal.typewriter.finish();
            self.session.update_message_content(reveal.id, &text);
            self.session.set_animating(None);
        }
    }

    fn failure_text(&self) -> String {
        format!(
            "Sorry, I encountered an error connecting to the backend. Please make sure the server is running on {}",
            self.client.origin()
        )
    }
}

impl Drop for Chat {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

async fn wait_dispatch(slot: &mut Option<Dispatch>) -> Result<Value, DispatchError> {
    match slot {
        Some(handle) => handle.await?,
        None => future::pending().await,
    }
}

async fn wait_frame(slot: &mut Option<Reveal>) -> Option<String> {
    match slot {
        Some(reveal) => reveal.typewriter.next_frame().await,
        None => future::pending().await,
    }
}
