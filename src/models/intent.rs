use serde::{Deserialize, Serialize};

/// What a client message asks for, independent of conversation state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Help,
    Cancel,
    Book,
    Price,
    Driver,
    Status,
    Unknown,
}

/// Reply to the confirmation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accept,
    Restart,
    Unclear,
}
