// Derived reports over fetched datasets.
// Pure functions; nothing here touches the network or the cache.

use indexmap::IndexMap;
use tracing::trace;

use crate::datasets::{UserActivity, UserMap};
use crate::slack::Message;

/// (user real name, message count), highest count first.
pub type ActivityReport = Vec<(String, usize)>;

/// Count messages per known user, most active first.
///
/// Messages without a user, or from a user id missing from `users`, are not
/// counted. Users with equal counts keep the order in which they were first
/// seen in `messages`.
pub fn top_users(messages: &[Message], users: &UserMap) -> ActivityReport {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for message in messages {
        let Some(user_id) = message.user.as_deref() else {
            continue;
        };
        let Some(name) = users.get(user_id) else {
            trace!(user_id, "message from unknown user, skipping");
            continue;
        };
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let mut report: ActivityReport = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    // Stable sort keeps first-seen order among ties.
    report.sort_by(|a, b| b.1.cmp(&a.1));
    report
}

/// Channels where the user posted at least once, with their message counts.
pub fn active_channels(activity: &UserActivity) -> Vec<(&str, usize)> {
    activity
        .iter()
        .filter(|(_, texts)| !texts.is_empty())
        .map(|(channel, texts)| (channel.as_str(), texts.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(user: &str) -> Message {
        Message {
            user: Some(user.to_string()),
            text: Some("hi".to_string()),
            ..Default::default()
        }
    }

    fn users() -> UserMap {
        [("UA", "Ada"), ("UB", "Bea"), ("UC", "Cy")]
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect()
    }

    #[test]
    fn test_top_users_ordering() {
        let mut messages = Vec::new();
        messages.extend((0..3).map(|_| from("UA")));
        messages.extend((0..5).map(|_| from("UB")));
        messages.push(from("UC"));

        assert_eq!(
            top_users(&messages, &users()),
            vec![
                ("Bea".to_string(), 5),
                ("Ada".to_string(), 3),
                ("Cy".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_top_users_skips_unknown_and_system_messages() {
        let messages = vec![
            from("UA"),
            from("U-departed"),
            Message {
                text: Some("channel topic changed".to_string()),
                ..Default::default()
            },
            from("UA"),
        ];
        assert_eq!(top_users(&messages, &users()), vec![("Ada".to_string(), 2)]);
    }

    #[test]
    fn test_top_users_ties_keep_first_seen_order() {
        let messages = vec![from("UC"), from("UA"), from("UA"), from("UC")];
        assert_eq!(
            top_users(&messages, &users()),
            vec![("Cy".to_string(), 2), ("Ada".to_string(), 2)]
        );
    }

    #[test]
    fn test_active_channels_filters_empty() {
        let mut activity = UserActivity::new();
        activity.insert("general".to_string(), vec!["a".to_string(), "b".to_string()]);
        activity.insert("random".to_string(), Vec::new());
        activity.insert("D42".to_string(), vec!["c".to_string()]);

        assert_eq!(active_channels(&activity), vec![("general", 2), ("D42", 1)]);
    }
}
