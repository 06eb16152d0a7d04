use feed_datastore::DataStore;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Profile, digest::DigestSink, resolver::ResolveTranscript, tracker::ProcessedStateFile,
    yt::FeedSource, SummaryPipeline, Summarizer,
};

pub struct SummaryPipelineBuilder<F = (), R = (), S = (), D = (), P = ()> {
    profile: Profile,
    feed_source: F,
    resolver: R,
    summarizer: S,
    store: D,
    processed_state: P,
    digest_sinks: Vec<Box<dyn DigestSink>>,
    cancellation_token: CancellationToken,
}

impl SummaryPipelineBuilder {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            feed_source: (),
            resolver: (),
            summarizer: (),
            store: (),
            processed_state: (),
            digest_sinks: Vec::new(),
            cancellation_token: CancellationToken::new(),
        }
    }
}

impl<F, R, S, D, P> SummaryPipelineBuilder<F, R, S, D, P> {
    pub fn feed_source<F2: FeedSource + Send + Sync>(
        self,
        feed_source: F2,
    ) -> SummaryPipelineBuilder<F2, R, S, D, P> {
        SummaryPipelineBuilder {
            profile: self.profile,
            feed_source,
            resolver: self.resolver,
            summarizer: self.summarizer,
            store: self.store,
            processed_state: self.processed_state,
            digest_sinks: self.digest_sinks,
            cancellation_token: self.cancellation_token,
        }
    }

    pub fn resolver<R2: ResolveTranscript + Send + Sync>(
        self,
        resolver: R2,
    ) -> SummaryPipelineBuilder<F, R2, S, D, P> {
        SummaryPipelineBuilder {
            profile: self.profile,
            feed_source: self.feed_source,
            resolver,
            summarizer: self.summarizer,
            store: self.store,
            processed_state: self.processed_state,
            digest_sinks: self.digest_sinks,
            cancellation_token: self.cancellation_token,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync>(
        self,
        summarizer: S2,
    ) -> SummaryPipelineBuilder<F, R, S2, D, P> {
        SummaryPipelineBuilder {
            profile: self.profile,
            feed_source: self.feed_source,
            resolver: self.resolver,
            summarizer,
            store: self.store,
            processed_state: self.processed_state,
            digest_sinks: self.digest_sinks,
            cancellation_token: self.cancellation_token,
        }
    }

    pub fn store<D2: DataStore + Send + Sync>(
        self,
        store: D2,
    ) -> SummaryPipelineBuilder<F, R, S, D2, P> {
        SummaryPipelineBuilder {
            profile: self.profile,
            feed_source: self.feed_source,
            resolver: self.resolver,
            summarizer: self.summarizer,
            store,
            processed_state: self.processed_state,
            digest_sinks: self.digest_sinks,
            cancellation_token: self.cancellation_token,
        }
    }

    pub fn processed_state<P2: ProcessedStateFile + Send + Sync>(
        self,
        processed_state: P2,
    ) -> SummaryPipelineBuilder<F, R, S, D, P2> {
        SummaryPipelineBuilder {
            profile: self.profile,
            feed_source: self.feed_source,
            resolver: self.resolver,
            summarizer: self.summarizer,
            store: self.store,
            processed_state,
            digest_sinks: self.digest_sinks,
            cancellation_token: self.cancellation_token,
        }
    }

    /// Adds a destination for the end-of-run digest; may be called repeatedly
    pub fn digest_sink(mut self, sink: impl DigestSink + 'static) -> Self {
        self.digest_sinks.push(Box::new(sink));
        self
    }

    pub fn cancellation_token(mut self, cancellation_token: CancellationToken) -> Self {
        self.cancellation_token = cancellation_token;
        self
    }
}

impl<F, R, S, D, P> SummaryPipelineBuilder<F, R, S, D, P>
where
    F: FeedSource + Send + Sync,
    R: ResolveTranscript + Send + Sync,
    S: Summarizer + Send + Sync,
    D: DataStore + Send + Sync,
    P: ProcessedStateFile + Send + Sync,
{
    pub fn build(self) -> SummaryPipeline<F, R, S, D, P> {
        SummaryPipeline {
            profile: self.profile,
            feed_source: self.feed_source,
            resolver: self.resolver,
            summarizer: self.summarizer,
            store: self.store,
            processed_state: self.processed_state,
            digest_sinks: self.digest_sinks,
            cancellation_token: self.cancellation_token,
        }
    }
}
