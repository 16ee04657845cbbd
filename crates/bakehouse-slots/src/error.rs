//! Error Types for bakehouse-slots

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlotError>;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Feed fetch failed: {0}")]
    Feed(#[from] reqwest::Error),

    #[error("Unknown slot: {0}")]
    UnknownSlot(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),
}
