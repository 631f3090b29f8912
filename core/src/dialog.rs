use crate::matcher::Matcher;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_START: &str = "q1";

/// Shown when the fallback lookup itself fails.
pub const ERROR_MESSAGE: &str = "An error occurred while fetching the response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Question,
    Response,
}

/// A node in the scripted dialog graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: NodeKind,
    #[serde(default)]
    pub next: Vec<String>,
}

fn default_kind() -> NodeKind { NodeKind::Question }

/// Prewritten answer attached to the question with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedResponse {
    pub id: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub text: String,
    pub is_user: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self { Self { text: text.into(), is_user: true } }
    pub fn bot(text: impl Into<String>) -> Self { Self { text: text.into(), is_user: false } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Scripted,
    Matched,
    Declined,
}

/// Result of one user selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub current: String,
    pub user: Message,
    pub bot: Message,
    pub source: ReplySource,
}

/// Where the fallback for unscripted nodes comes from.
///
/// The in-process [`Matcher`] never fails; transports that relay to a remote
/// matcher return `Err` and the walker shows [`ERROR_MESSAGE`].
pub trait Fallback {
    fn answer(&self, text: &str) -> Result<Option<String>>;
}

impl Fallback for Matcher {
    fn answer(&self, text: &str) -> Result<Option<String>> {
        let result = self.query(text);
        Ok(result.is_matched().then(|| result.reply().to_string()))
    }
}

/// Read-only question graph. Conversation position is passed in by the caller.
#[derive(Debug, Clone)]
pub struct DialogGraph {
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
    responses: HashMap<String, String>,
    start: String,
}

impl DialogGraph {
    pub fn new(questions: Vec<Question>, responses: Vec<ScriptedResponse>) -> Self {
        let mut by_id = HashMap::new();
        for (i, q) in questions.iter().enumerate() {
            // first definition of an id wins
            by_id.entry(q.id.clone()).or_insert(i);
        }
        let mut scripted = HashMap::new();
        for r in responses {
            scripted.entry(r.id).or_insert(r.response);
        }
        Self { questions, by_id, responses: scripted, start: DEFAULT_START.to_string() }
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    pub fn start_id(&self) -> &str { &self.start }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|&i| &self.questions[i])
    }

    pub fn scripted_response(&self, id: &str) -> Option<&str> {
        self.responses.get(id).map(String::as_str)
    }

    /// Opening messages: the start question and its scripted answer.
    /// Empty when either is missing.
    pub fn start(&self) -> Vec<Message> {
        match (self.question(&self.start), self.scripted_response(&self.start)) {
            (Some(q), Some(r)) => vec![Message::bot(&q.question), Message::bot(r)],
            _ => Vec::new(),
        }
    }

    /// Follow-up questions reachable from `current`; dangling ids are skipped.
    pub fn options(&self, current: &str) -> Vec<&Question> {
        match self.question(current) {
            Some(q) => q.next.iter().filter_map(|id| self.question(id)).collect(),
            None => Vec::new(),
        }
    }

    /// Answer the selection of `next_id`. `None` if no such question exists.
    pub fn select<F: Fallback + ?Sized>(&self, next_id: &str, fallback: &F) -> Option<Turn> {
        let q = self.question(next_id)?;
        let (text, source) = match self.scripted_response(&q.id) {
            Some(r) => (r.to_string(), ReplySource::Scripted),
            None => match fallback.answer(&q.question) {
                Ok(Some(text)) => (text, ReplySource::Matched),
                Ok(None) => (crate::matcher::DECLINE_MESSAGE.to_string(), ReplySource::Declined),
                Err(err) => {
                    tracing::warn!(question = %q.id, %err, "fallback lookup failed");
                    (ERROR_MESSAGE.to_string(), ReplySource::Declined)
                }
            },
        };
        Some(Turn { current: q.id.clone(), user: Message::user(&q.question), bot: Message::bot(text), source })
    }
}

/// In-memory walk through a [`DialogGraph`], holding the transcript so far.
#[derive(Debug, Clone)]
pub struct Conversation<'a> {
    graph: &'a DialogGraph,
    current: String,
    messages: Vec<Message>,
}

impl<'a> Conversation<'a> {
    pub fn start(graph: &'a DialogGraph) -> Self {
        Self { graph, current: graph.start_id().to_string(), messages: graph.start() }
    }

    pub fn current(&self) -> &str { &self.current }

    pub fn messages(&self) -> &[Message] { &self.messages }

    pub fn options(&self) -> Vec<&'a Question> { self.graph.options(&self.current) }

    pub fn is_finished(&self) -> bool { self.options().is_empty() }

    /// Only ids offered by [`Conversation::options`] are accepted.
    pub fn choose<F: Fallback + ?Sized>(&mut self, next_id: &str, fallback: &F) -> Option<Turn> {
        if !self.options().iter().any(|q| q.id == next_id) {
            return None;
        }
        let turn = self.graph.select(next_id, fallback)?;
        self.messages.push(turn.user.clone());
        self.messages.push(turn.bot.clone());
        self.current = turn.current.clone();
        Some(turn)
    }

    pub fn reset(&mut self) {
        self.current = self.graph.start_id().to_string();
        self.messages = self.graph.start();
    }
}
