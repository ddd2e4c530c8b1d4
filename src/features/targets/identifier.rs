//! User identifier parsing
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: Mentions, raw ids and member name prefixes

use regex::Regex;
use std::sync::OnceLock;

use super::MemberSummary;

static MENTION_OR_ID_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// `<@123>`, `<@!123>` or `123`, each optionally preceded by one backslash
fn mention_or_id_regex() -> Option<&'static Regex> {
    MENTION_OR_ID_REGEX
        .get_or_init(|| Regex::new(r"^\\?<@!?(\d+)>$|^\\?(\d+)$").ok())
        .as_ref()
}

/// Extract a user id from a token.
///
/// Mentions and raw ids are accepted structurally, without checking that the
/// user exists. Anything else is matched case-insensitively as a prefix of
/// each member's username or display name, in `scope` order; the first
/// member matching on either wins.
/// Without a scope only the structural forms resolve.
pub fn resolve_user_id(token: &str, scope: Option<&[MemberSummary]>) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Some(captures) = mention_or_id_regex().and_then(|re| re.captures(token)) {
        return captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_string());
    }

    let members = scope?;
    let needle = token.to_lowercase();

    members
        .iter()
        .find(|m| {
            m.username.to_lowercase().starts_with(&needle)
                || m.display_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().starts_with(&needle))
        })
        .map(|m| m.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, username: &str, display_name: Option<&str>) -> MemberSummary {
        MemberSummary {
            id: id.to_string(),
            username: username.to_string(),
            display_name: display_name.map(String::from),
        }
    }

    #[test]
    fn test_mention_forms() {
        assert_eq!(resolve_user_id("<@123456>", None).as_deref(), Some("123456"));
        assert_eq!(resolve_user_id("<@!123456>", None).as_deref(), Some("123456"));
        assert_eq!(resolve_user_id("123456", None).as_deref(), Some("123456"));
    }

    #[test]
    fn test_escaped_mention_forms() {
        assert_eq!(resolve_user_id("\\<@123456>", None).as_deref(), Some("123456"));
        assert_eq!(resolve_user_id("\\123456", None).as_deref(), Some("123456"));
    }

    #[test]
    fn test_malformed_mentions_rejected() {
        assert_eq!(resolve_user_id("<@12a>", None), None);
        assert_eq!(resolve_user_id("<#123>", None), None);
        assert_eq!(resolve_user_id("12 34", None), None);
    }

    #[test]
    fn test_name_without_scope_is_none() {
        assert_eq!(resolve_user_id("alice", None), None);
    }

    #[test]
    fn test_username_prefix_first_hit_wins() {
        let members = vec![
            member("1", "Bobby", None),
            member("2", "alice", None),
            member("3", "Alicia", None),
        ];
        assert_eq!(resolve_user_id("ALI", Some(&members)).as_deref(), Some("2"));
        assert_eq!(resolve_user_id("bob", Some(&members)).as_deref(), Some("1"));
        assert_eq!(resolve_user_id("carol", Some(&members)), None);
    }

    #[test]
    fn test_first_member_matching_either_name_wins() {
        let members = vec![
            member("1", "zed", Some("Sunny")),
            member("2", "sunflower", None),
        ];
        assert_eq!(resolve_user_id("sun", Some(&members)).as_deref(), Some("1"));
        assert_eq!(resolve_user_id("sunf", Some(&members)).as_deref(), Some("2"));
        assert_eq!(resolve_user_id("ZE", Some(&members)).as_deref(), Some("1"));
    }
}
