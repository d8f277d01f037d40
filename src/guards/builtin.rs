//! Stock guards: owner-only, guild-only, member permissions

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::UserId;
use serenity::model::permissions::Permissions;

use super::{Guard, GuardTarget};
use crate::commands::context::InteractionContext;

/// Passes only for configured bot owners
pub struct OwnerOnly {
    owners: HashSet<UserId>,
}

impl OwnerOnly {
    pub fn new(owners: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Guard for OwnerOnly {
    fn name(&self) -> &str {
        "owner_only"
    }

    fn targets(&self) -> &[GuardTarget] {
        GuardTarget::ALL
    }

    fn message(&self) -> Option<&str> {
        Some("🔒 Only the bot owner can use this.")
    }

    async fn check(&self, ctx: &InteractionContext) -> Result<bool> {
        Ok(self.owners.contains(&ctx.user_id()))
    }
}

/// Rejects interactions from DMs
pub struct GuildOnly;

#[async_trait]
impl Guard for GuildOnly {
    fn name(&self) -> &str {
        "guild_only"
    }

    fn targets(&self) -> &[GuardTarget] {
        GuardTarget::ALL
    }

    fn message(&self) -> Option<&str> {
        Some("This can only be used in a server.")
    }

    async fn check(&self, ctx: &InteractionContext) -> Result<bool> {
        Ok(ctx.guild_id().is_some())
    }
}

/// Requires the invoking member to hold every listed permission
///
/// Administrators always pass. Outside a guild there are no member
/// permissions, so the check fails.
pub struct RequirePermissions {
    required: Permissions,
    message: String,
}

impl RequirePermissions {
    pub fn new(required: Permissions) -> Self {
        Self {
            required,
            message: format!("You need the following permissions: {required}"),
        }
    }
}

#[async_trait]
impl Guard for RequirePermissions {
    fn name(&self) -> &str {
        "require_permissions"
    }

    fn targets(&self) -> &[GuardTarget] {
        GuardTarget::ALL
    }

    fn message(&self) -> Option<&str> {
        Some(&self.message)
    }

    async fn check(&self, ctx: &InteractionContext) -> Result<bool> {
        Ok(match ctx.member_permissions() {
            Some(perms) => perms.administrator() || perms.contains(self.required),
            None => false,
        })
    }
}
