//! Form-driven document console.
//!
//! [`Console`] holds everything one screen shows: the editable rows, the
//! query box, the last results and a status banner. It moves through
//! `Idle -> Submitting -> Idle` for each action, and a clear has to pass
//! through `ConfirmingClear` first. The page is server-rendered, so the
//! console is rebuilt from the submitted form on every request.

mod form;
mod handlers;
mod render;

pub use form::{ConsoleForm, FormAction};
pub use handlers::router;
pub use render::{ConsoleRenderer, RenderError};

use thiserror::Error;

use crate::error::DocumentError;
use crate::models::{AddOutcome, DistanceMetric, DocumentEntry, QueryResult};

/// A store-backed action triggered from the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Query,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting(Action),
    ConfirmingClear,
}

/// What the caller should do after [`Console::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// Perform the store call, then report back through [`Console::finish`]
    Proceed,
    /// Render the confirmation prompt; nothing is sent to the store yet
    AwaitConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("another action is still in progress")]
    Busy,

    #[error("confirm or cancel the pending clear first")]
    ConfirmationPending,

    #[error("no clear is awaiting confirmation")]
    NotConfirming,

    #[error("Please add at least one document")]
    NoDocuments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

impl Banner {
    pub fn is_success(&self) -> bool {
        matches!(self, Banner::Success(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Banner::Success(text) | Banner::Error(text) => text,
        }
    }
}

/// Results of the last query, kept for display
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    pub query: String,
    pub metric: DistanceMetric,
    pub result: QueryResult,
}

/// Result of the store call started by [`Console::begin`]
#[derive(Debug)]
pub enum Outcome {
    Added(AddOutcome),
    Queried(Results),
    Cleared,
    Failed(DocumentError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Console {
    rows: Vec<DocumentEntry>,
    query: String,
    phase: Phase,
    banner: Option<Banner>,
    results: Option<Results>,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            rows: vec![DocumentEntry::default()],
            query: String::new(),
            phase: Phase::Idle,
            banner: None,
            results: None,
        }
    }
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a console from submitted state. An empty row list becomes one
    /// empty row.
    pub fn restore(rows: Vec<DocumentEntry>, query: String, confirming_clear: bool) -> Self {
        let mut console = Self {
            rows,
            query,
            ..Self::default()
        };
        if console.rows.is_empty() {
            console.rows.push(DocumentEntry::default());
        }
        if confirming_clear {
            console.phase = Phase::ConfirmingClear;
        }
        console
    }

    pub fn rows(&self) -> &[DocumentEntry] {
        &self.rows
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Submitting(_))
    }

    /// Whether any row has non-blank text
    pub fn has_documents(&self) -> bool {
        self.rows.iter().any(|row| !row.document.trim().is_empty())
    }

    pub fn add_row(&mut self) {
        self.rows.push(DocumentEntry::default());
    }

    /// Remove a row; the last remaining row is kept and cleared instead.
    pub fn remove_row(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        self.rows.remove(index);
        if self.rows.is_empty() {
            self.rows.push(DocumentEntry::default());
        }
    }

    /// Reset to one empty row without touching the store
    pub fn reset_rows(&mut self) {
        self.rows = vec![DocumentEntry::default()];
    }

    pub fn set_document(&mut self, index: usize, text: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.document = text.into();
        }
    }

    pub fn set_metadata(&mut self, index: usize, text: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.metadata = text.into();
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Start an action.
    ///
    /// Clearing from `Idle` only asks for confirmation; a second `Clear`
    /// while confirming is the confirmation.
    pub fn begin(&mut self, action: Action) -> Result<Begin, ConsoleError> {
        match (self.phase, action) {
            (Phase::Submitting(_), _) => Err(ConsoleError::Busy),
            (Phase::ConfirmingClear, Action::Clear) => {
                self.phase = Phase::Submitting(Action::Clear);
                self.banner = None;
                Ok(Begin::Proceed)
            }
            (Phase::ConfirmingClear, _) => Err(ConsoleError::ConfirmationPending),
            (Phase::Idle, Action::Clear) => {
                self.phase = Phase::ConfirmingClear;
                Ok(Begin::AwaitConfirmation)
            }
            (Phase::Idle, Action::Add) => {
                if !self.has_documents() {
                    self.banner = Some(Banner::Error(ConsoleError::NoDocuments.to_string()));
                    return Err(ConsoleError::NoDocuments);
                }
                self.phase = Phase::Submitting(Action::Add);
                self.banner = None;
                Ok(Begin::Proceed)
            }
            (Phase::Idle, Action::Query) => {
                self.phase = Phase::Submitting(Action::Query);
                self.banner = None;
                self.results = None;
                Ok(Begin::Proceed)
            }
        }
    }

    pub fn confirm_clear(&mut self) -> Result<Begin, ConsoleError> {
        match self.phase {
            Phase::ConfirmingClear => self.begin(Action::Clear),
            _ => Err(ConsoleError::NotConfirming),
        }
    }

    pub fn cancel_clear(&mut self) -> Result<(), ConsoleError> {
        match self.phase {
            Phase::ConfirmingClear => {
                self.phase = Phase::Idle;
                Ok(())
            }
            _ => Err(ConsoleError::NotConfirming),
        }
    }

    /// Record the outcome of the in-flight action and return to `Idle`.
    pub fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Idle;
        self.banner = Some(match outcome {
            Outcome::Added(added) => {
                self.reset_rows();
                Banner::Success(format!(
                    "Successfully added {} documents with embeddings!",
                    added.count
                ))
            }
            Outcome::Queried(results) => {
                let banner = Banner::Success(format!("Found {} results", results.result.len()));
                self.results = Some(results);
                banner
            }
            Outcome::Cleared => {
                self.results = None;
                Banner::Success("Collection cleared successfully!".to_string())
            }
            Outcome::Failed(err) => Banner::Error(format!("Error: {}", banner_message(&err))),
        });
    }
}

/// What the user reads for a failed call: the operation message plus its
/// cause for store failures.
fn banner_message(err: &DocumentError) -> String {
    match err {
        DocumentError::Validation(msg) => msg.clone(),
        DocumentError::Store { action, source } => format!("{action} ({source})"),
    }
}
