// Report output.
// Writes workspace summaries to stdout, the email list to a CSV file, and asks for confirmation.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::analysis::{ActivityReport, active_channels};
use crate::datasets::{ChannelMap, EmailMap, UserActivity};
use crate::error::Result;

/// Print the channel list, totals, and the top of the leaderboard.
pub fn write_overview<W: Write>(
    out: &mut W,
    channels: &ChannelMap,
    user_count: usize,
    message_count: usize,
    leaderboard: &ActivityReport,
    top: usize,
) -> io::Result<()> {
    let names: Vec<&str> = channels.keys().map(String::as_str).collect();
    writeln!(out, "Channels searched: {}", names.join(", "))?;
    writeln!(out, "Total users: {}", user_count)?;
    writeln!(out, "Total messages in all channels: {}", message_count)?;
    writeln!(out)?;
    writeln!(out, "Messages sent by the top {} users:", top)?;

    let width = leaderboard
        .iter()
        .take(top)
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (rank, (name, count)) in leaderboard.iter().take(top).enumerate() {
        writeln!(out, "{:>3}. {:<width$}  {}", rank + 1, name, count)?;
    }
    Ok(())
}

/// Print per-channel message counts for one user, skipping channels without messages.
pub fn write_user_breakdown<W: Write>(
    out: &mut W,
    user_name: &str,
    activity: &UserActivity,
) -> io::Result<()> {
    writeln!(out, "Messages sent by {}:", user_name)?;
    let channels = active_channels(activity);
    if channels.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (channel, count) in channels {
        writeln!(out, "  {}: {}", channel, count)?;
    }
    Ok(())
}

/// Write `name,email` lines to `path`.
pub fn write_emails_csv(path: &Path, emails: &EmailMap) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut contents = String::new();
    for (name, email) in emails {
        contents.push_str(&csv_field(name));
        contents.push(',');
        contents.push_str(&csv_field(email));
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Quote a field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Ask a yes/no question. Only an answer starting with `y` or `Y` counts as yes.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim_start().starts_with(['y', 'Y']))
}
