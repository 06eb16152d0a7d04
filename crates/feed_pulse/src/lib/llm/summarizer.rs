use std::{
    fmt::{Debug, Display},
    future::Future,
};

use serde::Deserialize;

pub trait Summarizer {
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug + Display + Send;

    /// Sends a fully rendered prompt and returns the model's text
    fn summarize(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
