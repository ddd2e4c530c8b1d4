//! Stored bot statuses
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Status kinds, argument parsing and count placeholders

use std::fmt;
use thiserror::Error;

pub const DEFAULT_STREAM_URL: &str = "https://www.twitch.tv/TheOldZoom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Playing,
    Watching,
    Listening,
    Competing,
    Streaming,
    Custom,
}

impl StatusKind {
    pub const ALL: [StatusKind; 6] = [
        StatusKind::Playing,
        StatusKind::Watching,
        StatusKind::Listening,
        StatusKind::Competing,
        StatusKind::Streaming,
        StatusKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Playing => "Playing",
            StatusKind::Watching => "Watching",
            StatusKind::Listening => "Listening",
            StatusKind::Competing => "Competing",
            StatusKind::Streaming => "Streaming",
            StatusKind::Custom => "Custom",
        }
    }

    /// Case-insensitive parse of a kind name
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status row as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub id: i64,
    pub kind: StatusKind,
    pub text: String,
    pub url: Option<String>,
}

/// A status about to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatus {
    pub kind: StatusKind,
    pub text: String,
    pub url: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusArgsError {
    #[error("Please provide both a status type and text.\nUsage: `status add <type> <text> [url]`\nValid types: {}", valid_kinds())]
    Missing,

    #[error("Invalid status type. Valid types are: {}", valid_kinds())]
    InvalidKind,
}

fn valid_kinds() -> String {
    StatusKind::ALL
        .iter()
        .map(StatusKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl NewStatus {
    /// Parse `<type> <text...> [url]`.
    ///
    /// Only streaming statuses carry a URL: a trailing argument starting with
    /// `http` is taken as the stream link, otherwise the default link is used.
    pub fn from_args(args: &[String]) -> Result<Self, StatusArgsError> {
        let (kind, rest) = match args {
            [kind, rest @ ..] if !rest.is_empty() => (kind, rest),
            _ => return Err(StatusArgsError::Missing),
        };
        let kind = StatusKind::parse(kind).ok_or(StatusArgsError::InvalidKind)?;

        let mut words: Vec<&str> = rest.iter().map(String::as_str).collect();
        let url = if kind == StatusKind::Streaming {
            match words.last() {
                Some(last) if last.starts_with("http") && words.len() > 1 => {
                    let url = last.to_string();
                    words.pop();
                    Some(url)
                }
                _ => Some(DEFAULT_STREAM_URL.to_string()),
            }
        } else {
            None
        };

        Ok(Self {
            kind,
            text: words.join(" "),
            url,
        })
    }
}

/// Values substituted into status text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceCounts {
    pub guilds: usize,
    pub users: usize,
    pub commands: usize,
}

/// Replace `{guilds.size}`, `{users.size}` and `{commands.size}`
pub fn expand_placeholders(text: &str, counts: PresenceCounts) -> String {
    text.replace("{guilds.size}", &counts.guilds.to_string())
        .replace("{users.size}", &counts.users.to_string())
        .replace("{commands.size}", &counts.commands.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str) -> Vec<String> {
        input.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(StatusKind::parse("playing"), Some(StatusKind::Playing));
        assert_eq!(StatusKind::parse("Streaming"), Some(StatusKind::Streaming));
        assert_eq!(StatusKind::parse("dancing"), None);
        assert_eq!(StatusKind::Competing.to_string(), "Competing");
    }

    #[test]
    fn test_from_args_plain() {
        let status = NewStatus::from_args(&args("Playing with {guilds.size} servers")).unwrap();
        assert_eq!(status.kind, StatusKind::Playing);
        assert_eq!(status.text, "with {guilds.size} servers");
        assert_eq!(status.url, None);
    }

    #[test]
    fn test_from_args_streaming_url() {
        let status =
            NewStatus::from_args(&args("Streaming lofi beats https://twitch.tv/someone")).unwrap();
        assert_eq!(status.text, "lofi beats");
        assert_eq!(status.url.as_deref(), Some("https://twitch.tv/someone"));

        let status = NewStatus::from_args(&args("streaming lofi")).unwrap();
        assert_eq!(status.url.as_deref(), Some(DEFAULT_STREAM_URL));
    }

    #[test]
    fn test_from_args_errors() {
        assert_eq!(
            NewStatus::from_args(&args("Playing")),
            Err(StatusArgsError::Missing)
        );
        assert_eq!(
            NewStatus::from_args(&args("Dancing all night")),
            Err(StatusArgsError::InvalidKind)
        );
        assert!(StatusArgsError::InvalidKind
            .to_string()
            .ends_with("Playing, Watching, Listening, Competing, Streaming, Custom"));
    }

    #[test]
    fn test_expand_placeholders() {
        let counts = PresenceCounts {
            guilds: 12,
            users: 3400,
            commands: 15,
        };
        assert_eq!(
            expand_placeholders("{guilds.size} servers, {users.size} users, {commands.size} commands", counts),
            "12 servers, 3400 users, 15 commands"
        );
        assert_eq!(expand_placeholders("plain", counts), "plain");
    }
}
