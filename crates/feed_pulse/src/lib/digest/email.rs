use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header, Mailbox, Message},
    transport::smtp::{authentication::Credentials, AsyncSmtpTransport},
    AsyncTransport, Tokio1Executor,
};

use crate::digest::{DigestSink, RunDigest};

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
    /// Defaults to `from` when empty
    pub to: Option<String>,
}

pub struct EmailDigestSink {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailDigestSink {
    pub fn new(settings: SmtpSettings) -> anyhow::Result<Self> {
        let creds = Credentials::new(settings.username, settings.password);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .with_context(|| format!("invalid SMTP host {}", settings.host))?
            .credentials(creds)
            .build();

        let from: Mailbox = settings
            .from
            .parse()
            .with_context(|| format!("invalid sender address {}", settings.from))?;
        let to = match settings.to.filter(|to| !to.trim().is_empty()) {
            Some(to) => to
                .parse()
                .with_context(|| format!("invalid recipient address {to}"))?,
            None => from.clone(),
        };

        Ok(Self { mailer, from, to })
    }

    pub fn build_message(&self, digest: &RunDigest) -> anyhow::Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(digest.subject())
            .header(header::ContentType::TEXT_PLAIN)
            .body(digest.render())
            .context("build email")
    }
}

#[async_trait]
impl DigestSink for EmailDigestSink {
    fn name(&self) -> &str {
        "email"
    }

    async fn emit(&self, digest: &RunDigest) -> anyhow::Result<String> {
        let message = self.build_message(digest)?;
        self.mailer.send(message).await.context("send email")?;

        tracing::info!(to = %self.to, "Digest emailed");
        Ok(self.to.to_string())
    }
}
