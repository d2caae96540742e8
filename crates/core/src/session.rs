use crate::render::StatusMessage;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-submission context handed through every poll step.
#[derive(Debug)]
pub struct SearchSession {
    pub(crate) id: Uuid,
    pub(crate) generation: u64,
    pub(crate) query: String,
    pub(crate) cancel: CancellationToken,
    pub(crate) waiting: StatusMessage,
    pub(crate) searching: StatusMessage,
}

impl SearchSession {
    pub(crate) fn new(generation: u64, query: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
            query,
            cancel: CancellationToken::new(),
            waiting: StatusMessage::waiting(),
            searching: StatusMessage::searching(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
