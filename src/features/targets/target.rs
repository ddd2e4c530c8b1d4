//! Target user resolution
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: Uniform not-found and bot handling for user targeted commands

use log::debug;
use thiserror::Error;

use super::{TargetUser, UserDirectory};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("No user ID was provided")]
    NoId,

    #[error("User not found")]
    NotFound,

    #[error("This command cannot be used on bots")]
    BotsNotAllowed,
}

/// Fetch the user behind an already resolved id
pub async fn resolve_target(
    users: &dyn UserDirectory,
    id: Option<&str>,
    allow_bots: bool,
) -> Result<TargetUser, TargetError> {
    let id = id.ok_or(TargetError::NoId)?;

    let user = users.fetch_user(id).await.map_err(|e| {
        debug!("User lookup for {id} failed: {e}");
        TargetError::NotFound
    })?;

    if user.bot && !allow_bots {
        return Err(TargetError::BotsNotAllowed);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockUsers;

    fn directory() -> MockUsers {
        MockUsers::new()
            .with_user("100", "alice", false)
            .with_user("200", "robot", true)
    }

    #[tokio::test]
    async fn test_missing_id() {
        let err = resolve_target(&directory(), None, true).await.unwrap_err();
        assert_eq!(err, TargetError::NoId);
        assert_eq!(err.to_string(), "No user ID was provided");
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let err = resolve_target(&directory(), Some("999"), true).await.unwrap_err();
        assert_eq!(err, TargetError::NotFound);
        assert_eq!(err.to_string(), "User not found");
    }

    #[tokio::test]
    async fn test_bot_filtering() {
        let users = directory();
        assert_eq!(
            resolve_target(&users, Some("200"), false).await.unwrap_err(),
            TargetError::BotsNotAllowed
        );
        let bot = resolve_target(&users, Some("200"), true).await.unwrap();
        assert!(bot.bot);
    }

    #[tokio::test]
    async fn test_found_user() {
        let user = resolve_target(&directory(), Some("100"), false).await.unwrap();
        assert_eq!(user.username, "alice");
    }
}
