use async_trait::async_trait;

/// Outbound notification channel.
///
/// Delivery is best-effort: implementations log failures and return
/// normally, so callers never branch on whether a message arrived.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable channel identifier (e.g. `telegram`).
    fn id(&self) -> &'static str;

    /// Whether the channel has the credentials it needs to send.
    fn is_configured(&self) -> bool;

    /// Deliver `text`, splitting it if it exceeds the channel limit.
    async fn notify(&self, text: &str);
}

/// Chat message extracted from an inbound webhook update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub text: String,
}
