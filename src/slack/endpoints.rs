// Slack API endpoint functions.
// Implements the remote capability on top of the Web API methods.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::client::{SlackClient, check_connection_payload};
use super::remote::RemoteClient;
use super::types::{
    Channel, ChannelType, Member, Message, OutgoingMessage, PostedMessage, User,
};

/// Response wrapper for `conversations.list`.
#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    channels: Vec<Channel>,
}

/// Response wrapper for `users.list`.
#[derive(Debug, Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<Member>,
}

/// Response wrapper for `conversations.history`.
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

/// Request body for `chat.postMessage`.
#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_emoji: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<&'a str>,
}

impl<'a> PostMessageRequest<'a> {
    fn new(channel: &'a str, message: &'a OutgoingMessage) -> Self {
        let icon = message.icon.as_deref();
        let is_emoji = icon.is_some_and(|i| i.starts_with(':') && i.ends_with(':'));
        Self {
            channel,
            text: &message.text,
            username: message.username.as_deref(),
            icon_emoji: icon.filter(|_| is_emoji),
            icon_url: icon.filter(|_| !is_emoji),
        }
    }
}

impl RemoteClient for SlackClient {
    async fn list_channels(&self, types: &[ChannelType]) -> Result<Vec<Channel>> {
        let params = [("types", ChannelType::join(types)), ("limit", "1000".to_string())];
        let payload = self.get("conversations.list", &params).await?;
        let wrapper: ChannelsResponse = serde_json::from_value(payload)?;
        Ok(wrapper.channels)
    }

    async fn list_users(&self, limit: u32) -> Result<Vec<User>> {
        let params = [("limit", limit.to_string())];
        let payload = self.get("users.list", &params).await?;
        let wrapper: MembersResponse = serde_json::from_value(payload)?;
        Ok(wrapper.members.into_iter().map(User::from).collect())
    }

    async fn fetch_history(&self, channel_id: &str, limit: u32) -> Result<Vec<Message>> {
        let params = [
            ("channel", channel_id.to_string()),
            ("limit", limit.to_string()),
        ];
        let payload = self.get("conversations.history", &params).await?;
        let wrapper: HistoryResponse = serde_json::from_value(payload)?;
        Ok(wrapper.messages)
    }

    async fn post_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<PostedMessage> {
        let body = PostMessageRequest::new(channel_id, message);
        let payload = self.post_json("chat.postMessage", &body).await?;
        let posted: PostedMessage = serde_json::from_value(payload)?;
        Ok(posted)
    }

    async fn check_connection(&self) -> Result<()> {
        let payload = self.get_raw("users.list", &[("limit", "1".to_string())]).await?;
        check_connection_payload(&payload)
    }
}
