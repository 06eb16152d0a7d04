use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use feed_pulse::digest::{DigestSink, RunDigest};

#[derive(Clone, Default)]
pub struct MockDigestSink {
    fail: bool,
    pub emitted: Arc<Mutex<Vec<RunDigest>>>,
}

impl MockDigestSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn digests(&self) -> Vec<RunDigest> {
        self.emitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DigestSink for MockDigestSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn emit(&self, digest: &RunDigest) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("SMTP relay rejected the message");
        }
        self.emitted.lock().unwrap().push(digest.clone());
        Ok("mock://digest".into())
    }
}
