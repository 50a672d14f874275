//! Building blocks for the stockbrief research service.
//!
//! The crate provides a small agent runtime and the service built on it:
//! - A language model abstraction (`LanguageModelClient`) with a typed
//!   final-answer/tool-call response.
//! - A tool interface (`Tool` and `ToolRegistry`) agents invoke mid-reasoning.
//! - An `Agent` that loops between the model and its tools, and a sequential
//!   `Pipeline` of `Task`s that feeds each task its dependencies' outputs.
//! - A single-slot `ReportCache` safe under concurrent refresh, served over a
//!   minimal web page.

mod agent;
mod cache;
mod config;
pub mod desk;
mod error;
mod llm;
mod pipeline;
mod server;
mod task;
mod tool;
pub mod tools;

pub use agent::Agent;
pub use cache::ReportCache;
pub use config::{AgentConfig, AppConfig, ModelConfig, SearchSettings, ServerConfig};
pub use error::{BriefError, Result};
pub use llm::{LanguageModelClient, ModelResponse, OpenRouterClient, StubClient};
pub use pipeline::{Pipeline, PipelineResult};
pub use server::{router, serve, AppState};
pub use task::Task;
pub use tool::{Tool, ToolRegistry, ToolSpec};
