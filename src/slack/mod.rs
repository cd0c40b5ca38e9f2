// Slack API module.
// Provides the remote capability trait, its HTTP client, and the API types.

pub mod client;
pub mod endpoints;
pub mod remote;
pub mod types;

pub use client::{SLACK_API_BASE, SlackClient};
pub use remote::RemoteClient;
pub use types::*;
