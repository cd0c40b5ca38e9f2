// Remote capability over the chat API.
// Datasets depend on this trait, never on the HTTP client directly.

use crate::error::Result;

use super::types::{Channel, ChannelType, Message, OutgoingMessage, PostedMessage, User};

/// Operations the tool needs from the chat workspace.
///
/// Calls are made one at a time by a single caller, so implementations need
/// not be `Send` or `Sync`.
#[allow(async_fn_in_trait)]
pub trait RemoteClient {
    /// List conversations of the given kinds.
    async fn list_channels(&self, types: &[ChannelType]) -> Result<Vec<Channel>>;

    /// List workspace members, at most `limit` of them.
    async fn list_users(&self, limit: u32) -> Result<Vec<User>>;

    /// Fetch the newest `limit` messages of a conversation. Older pages are not followed.
    async fn fetch_history(&self, channel_id: &str, limit: u32) -> Result<Vec<Message>>;

    /// Post a message to a conversation.
    async fn post_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage>;

    /// Verify the credential and connectivity with a lightweight call.
    async fn check_connection(&self) -> Result<()>;
}
