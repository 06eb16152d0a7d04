pub mod api;
pub mod config;
pub mod digest;
pub mod duration;
mod error;
pub mod filter;
mod llm;
pub mod pipeline;
pub mod resolver;
pub mod runner;
pub mod tracing;
pub mod tracker;
pub mod types;
pub mod yt;

pub use error::{Error, Result};
pub use llm::openai;
pub use llm::{
    summarizer::{Summarizer, SummaryResponse},
    transcriber::{AudioInput, TranscribeResponse, Transcriber},
};
pub use pipeline::{builder::SummaryPipelineBuilder, SummaryPipeline};
