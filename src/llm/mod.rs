// LLM abstraction layer

pub mod provider;
pub mod openai;
pub mod anthropic;
pub mod openrouter;
pub mod groq;
pub mod scripted;

pub use provider::*;
pub use scripted::ScriptedLLM;
pub use crate::types::*;
