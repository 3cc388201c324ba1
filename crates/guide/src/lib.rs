//! Content-panel and analytics backends: AI travel briefs, country-scoped chat
//! and bar-race datasets, all produced through an OpenAI-compatible API.

pub mod bar_race;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod sse;
pub mod stream;

pub use bar_race::{RaceDataset, RaceEntry, RaceFrame};
pub use chat::{ChatHistory, ChatMessage, Role};
pub use client::LlmClient;
pub use config::GuideConfig;
pub use error::GuideError;
pub use stream::{CancelHandle, FragmentStream};
