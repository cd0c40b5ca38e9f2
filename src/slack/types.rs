// Slack Web API types.
// Wire records as the API returns them, and the normalized records the rest of the tool uses.

use serde::{Deserialize, Serialize};

/// Text substituted for thread replies when they are flattened into a channel's history.
pub const THREAD_REPLY_PLACEHOLDER: &str = "N/A; was found in thread";

/// Conversation kind accepted by the `types` filter of `conversations.list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    Public,
    Private,
    /// Multi-person direct message.
    Group,
    /// One-to-one direct message.
    Direct,
}

impl ChannelType {
    pub const ALL: [ChannelType; 4] = [
        ChannelType::Public,
        ChannelType::Private,
        ChannelType::Group,
        ChannelType::Direct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Public => "public_channel",
            ChannelType::Private => "private_channel",
            ChannelType::Group => "mpim",
            ChannelType::Direct => "im",
        }
    }

    /// Comma-separated form used as a query parameter.
    pub fn join(types: &[ChannelType]) -> String {
        types
            .iter()
            .map(ChannelType::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Conversation (channel, group, or direct message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Absent for direct messages.
    #[serde(default)]
    pub name: Option<String>,
}

impl Channel {
    /// Human name, or the id for conversations without one.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Workspace member after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub real_name: String,
    /// Present only when the token carries the `users:read.email` scope.
    pub email: Option<String>,
}

/// Member record as returned by `users.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

/// Profile block nested in a member record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<Member> for User {
    fn from(member: Member) -> Self {
        let profile = member.profile.unwrap_or_default();
        let real_name = [member.real_name, profile.real_name, member.name]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| member.id.clone());
        let email = profile.email.filter(|email| !email.is_empty());

        Self {
            id: member.id,
            real_name,
            email,
        }
    }
}

/// Message in a conversation's history.
///
/// Every field is optional: system messages carry no `user`, attachments may
/// carry no `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Thread replies attached to a parent message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Message>,
}

impl Message {
    /// Whether this message was posted by `user_id`.
    pub fn is_from(&self, user_id: &str) -> bool {
        self.user.as_deref() == Some(user_id)
    }
}

/// Message to send with `chat.postMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    /// Display name shown instead of the app's name.
    pub username: Option<String>,
    /// `:emoji:` shortcode or image URL.
    pub icon: Option<String>,
}

/// Delivery receipt returned by `chat.postMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_join() {
        assert_eq!(
            ChannelType::join(&ChannelType::ALL),
            "public_channel,private_channel,mpim,im"
        );
    }

    #[test]
    fn test_channel_display_name_falls_back_to_id() {
        let named: Channel = serde_json::from_str(r#"{"id":"C1","name":"general"}"#).unwrap();
        let direct: Channel = serde_json::from_str(r#"{"id":"D1","is_im":true}"#).unwrap();
        assert_eq!(named.display_name(), "general");
        assert_eq!(direct.display_name(), "D1");
    }

    #[test]
    fn test_member_normalization() {
        let member: Member = serde_json::from_str(
            r#"{"id":"U1","name":"ada","real_name":"Ada Lovelace",
                "profile":{"email":"ada@example.com"}}"#,
        )
        .unwrap();
        let user = User::from(member);
        assert_eq!(user.real_name, "Ada Lovelace");
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));

        let bot: Member =
            serde_json::from_str(r#"{"id":"B1","name":"deploybot","profile":{}}"#).unwrap();
        let user = User::from(bot);
        assert_eq!(user.real_name, "deploybot");
        assert_eq!(user.email, None);

        let bare: Member = serde_json::from_str(r#"{"id":"U9"}"#).unwrap();
        assert_eq!(User::from(bare).real_name, "U9");
    }

    #[test]
    fn test_message_tolerates_missing_fields() {
        let message: Message = serde_json::from_str(
            r#"{"type":"message","subtype":"channel_join","ts":"1.0",
                "replies":[{"user":"U2","ts":"2.0"}]}"#,
        )
        .unwrap();
        assert_eq!(message.user, None);
        assert_eq!(message.text, None);
        assert_eq!(message.replies.len(), 1);
        assert!(message.replies[0].is_from("U2"));
    }
}
