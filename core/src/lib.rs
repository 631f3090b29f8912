//! Scripted chat dialog with a TF-IDF fallback over a small knowledge base.
//!
//! The index is built once from an ordered corpus and never mutated, so a
//! [`Matcher`] can be shared across threads behind an `Arc` without locking.

pub mod dialog;
pub mod index;
pub mod knowledge;
pub mod matcher;
pub mod persist;
pub mod tokenizer;

pub use dialog::{Conversation, DialogGraph, Fallback, Message, Question, ScriptedResponse, Turn};
pub use index::{DocId, TermId, TfIdfIndex};
pub use knowledge::{ChatData, KnowledgeEntry};
pub use matcher::{MatchResult, Matcher, DECLINE_MESSAGE, DEFAULT_THRESHOLD};
