//! Client contract and concrete implementation for the remote
//! text-generation service the orchestrator drives.

mod client;
mod openai;

pub use client::{GenerationRequest, GenerationResponse, RawResponse, RemoteError, TextGenClient};
pub use openai::OpenAiCompatibleClient;
