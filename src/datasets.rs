// Named datasets backed by the keyed cache.
// Each dataset is fetched from the remote client on a miss and read from disk otherwise.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::cache::KeyedCache;
use crate::error::{Result, SlackstatError};
use crate::slack::{ChannelType, Message, RemoteClient, THREAD_REPLY_PLACEHOLDER};

/// Page size requested from every list and history call.
pub const PAGE_SIZE: u32 = 1000;

pub const CHANNELS_KEY: &str = "channels";
pub const USERS_KEY: &str = "userlist";
pub const EMAILS_KEY: &str = "useremails";
pub const ALL_HISTORY_KEY: &str = "all_history";

/// Channel display name to channel id, in API order.
pub type ChannelMap = IndexMap<String, String>;
/// User id to real name, in API order.
pub type UserMap = IndexMap<String, String>;
/// Real name to email address.
pub type EmailMap = IndexMap<String, String>;
/// Channel display name to the texts one user posted there.
pub type UserActivity = IndexMap<String, Vec<String>>;

pub fn history_key(channel_id: &str) -> String {
    format!("conversation_{}_history", channel_id)
}

pub fn user_activity_key(user_name: &str) -> String {
    format!("user_{}", user_name)
}

/// Every fetched message, flat and grouped by channel id.
///
/// Both views are stored under the single `all_history` entry, so the shape a
/// caller asks for never depends on which caller populated the cache first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// All messages, channel by channel in channel-map order.
    pub messages: Vec<Message>,
    /// Channel id to that channel's messages.
    pub by_channel: IndexMap<String, Vec<Message>>,
}

/// Shape of the aggregate history returned to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryView {
    Flat(Vec<Message>),
    Breakdown(HistorySnapshot),
}

impl HistoryView {
    pub fn messages(&self) -> &[Message] {
        match self {
            HistoryView::Flat(messages) => messages,
            HistoryView::Breakdown(snapshot) => &snapshot.messages,
        }
    }
}

/// Dependent datasets over one remote client and one cache directory.
///
/// A forced dataset is fetched at most once per graph; later forced requests
/// for the same key read the entry that fetch stored.
pub struct DatasetGraph<'a, C> {
    client: &'a C,
    cache: &'a KeyedCache,
    refresh_history: bool,
    forced: RefCell<HashSet<String>>,
}

impl<'a, C: RemoteClient> DatasetGraph<'a, C> {
    pub fn new(client: &'a C, cache: &'a KeyedCache) -> Self {
        Self {
            client,
            cache,
            refresh_history: false,
            forced: RefCell::new(HashSet::new()),
        }
    }

    /// Also re-fetch per-channel histories when the aggregate history is forced.
    pub fn with_history_refresh(mut self, refresh_history: bool) -> Self {
        self.refresh_history = refresh_history;
        self
    }

    /// Whether `key` should be recomputed now. True only for the first forced request.
    fn take_force(&self, key: &str, force: bool) -> bool {
        force && self.forced.borrow_mut().insert(key.to_string())
    }

    pub fn client(&self) -> &'a C {
        self.client
    }

    /// Display name to id for every public, private, group, and direct conversation.
    pub async fn channels(&self, force: bool) -> Result<ChannelMap> {
        let refresh = self.take_force(CHANNELS_KEY, force);
        self.cache
            .get_or_compute(CHANNELS_KEY, refresh, || self.fetch_channels())
            .await
    }

    /// One conversation's newest page of messages, thread replies flattened in.
    pub async fn conversation_history(&self, channel_id: &str, force: bool) -> Result<Vec<Message>> {
        let key = history_key(channel_id);
        let refresh = self.take_force(&key, force);
        self.cache
            .get_or_compute(&key, refresh, || self.fetch_conversation_history(channel_id))
            .await
    }

    /// Messages of every channel, optionally with the per-channel breakdown.
    pub async fn all_history(&self, force: bool, include_breakdown: bool) -> Result<HistoryView> {
        let snapshot = self.history_snapshot(force).await?;
        Ok(if include_breakdown {
            HistoryView::Breakdown(snapshot)
        } else {
            HistoryView::Flat(snapshot.messages)
        })
    }

    async fn history_snapshot(&self, force: bool) -> Result<HistorySnapshot> {
        let refresh = self.take_force(ALL_HISTORY_KEY, force);
        self.cache
            .get_or_compute(ALL_HISTORY_KEY, refresh, || self.fetch_all_history(force))
            .await
    }

    /// User id to real name.
    pub async fn all_users(&self, force: bool) -> Result<UserMap> {
        let refresh = self.take_force(USERS_KEY, force);
        self.cache
            .get_or_compute(USERS_KEY, refresh, || self.fetch_users())
            .await
    }

    /// Real name to email, for users whose email is visible to the token.
    pub async fn all_emails(&self, force: bool) -> Result<EmailMap> {
        let refresh = self.take_force(EMAILS_KEY, force);
        self.cache
            .get_or_compute(EMAILS_KEY, refresh, || self.fetch_emails())
            .await
    }

    /// Texts posted by the user named `user_name`, grouped by channel display name.
    pub async fn user_activity(&self, user_name: &str, force: bool) -> Result<UserActivity> {
        let key = user_activity_key(user_name);
        let refresh = self.take_force(&key, force);
        self.cache
            .get_or_compute(&key, refresh, || self.fetch_user_activity(user_name, force))
            .await
    }

    async fn fetch_channels(&self) -> Result<ChannelMap> {
        let raw = self.client.list_channels(&ChannelType::ALL).await?;
        let channels: ChannelMap = raw
            .iter()
            .map(|c| (c.display_name().to_string(), c.id.clone()))
            .collect();
        info!(count = channels.len(), "fetched channels");
        Ok(channels)
    }

    async fn fetch_conversation_history(&self, channel_id: &str) -> Result<Vec<Message>> {
        let raw = self.client.fetch_history(channel_id, PAGE_SIZE).await?;
        let messages = flatten_replies(raw);
        info!(channel_id, count = messages.len(), "fetched conversation history");
        Ok(messages)
    }

    async fn fetch_all_history(&self, force: bool) -> Result<HistorySnapshot> {
        let channels = self.channels(force).await?;

        let mut snapshot = HistorySnapshot::default();
        for channel_id in channels.values() {
            let history = self
                .conversation_history(channel_id, force && self.refresh_history)
                .await?;
            snapshot.messages.extend(history.iter().cloned());
            snapshot.by_channel.insert(channel_id.clone(), history);
        }

        info!(
            channels = snapshot.by_channel.len(),
            messages = snapshot.messages.len(),
            "assembled history"
        );
        Ok(snapshot)
    }

    async fn fetch_users(&self) -> Result<UserMap> {
        let raw = self.client.list_users(PAGE_SIZE).await?;
        let users: UserMap = raw.into_iter().map(|u| (u.id, u.real_name)).collect();
        info!(count = users.len(), "fetched users");
        Ok(users)
    }

    async fn fetch_emails(&self) -> Result<EmailMap> {
        let raw = self.client.list_users(PAGE_SIZE).await?;
        let emails: EmailMap = raw
            .into_iter()
            .filter_map(|u| match u.email {
                Some(email) => Some((u.real_name, email)),
                None => {
                    trace!(user = %u.id, "no email visible, skipping");
                    None
                }
            })
            .collect();
        info!(count = emails.len(), "fetched emails");
        Ok(emails)
    }

    async fn fetch_user_activity(&self, user_name: &str, force: bool) -> Result<UserActivity> {
        let users = self.all_users(false).await?;
        let user_id = users
            .iter()
            .find(|(_, name)| name.as_str() == user_name)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| SlackstatError::UnknownUser(user_name.to_string()))?;

        let snapshot = self.history_snapshot(force).await?;

        // Read after the snapshot so a forced run names channels from the fresh list.
        let channels = self.channels(false).await?;
        let names_by_id: HashMap<&str, &str> = channels
            .iter()
            .map(|(name, id)| (id.as_str(), name.as_str()))
            .collect();

        let mut activity = UserActivity::new();
        for (channel_id, messages) in &snapshot.by_channel {
            let channel_name = names_by_id
                .get(channel_id.as_str())
                .copied()
                .unwrap_or(channel_id.as_str());
            let texts = messages
                .iter()
                .filter(|m| m.is_from(&user_id))
                .filter_map(|m| m.text.clone())
                .collect();
            activity.insert(channel_name.to_string(), texts);
        }
        Ok(activity)
    }
}

/// Append every thread reply to the message list with its text masked.
///
/// Appended replies are walked too, so nested replies are flattened as well.
pub fn flatten_replies(mut messages: Vec<Message>) -> Vec<Message> {
    let mut i = 0;
    while i < messages.len() {
        let replies = messages[i].replies.clone();
        messages.extend(replies.into_iter().map(|mut reply| {
            reply.text = Some(THREAD_REPLY_PLACEHOLDER.to_string());
            reply
        }));
        i += 1;
    }
    messages
}
