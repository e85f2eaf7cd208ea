//! Mapping provider profiles to local users.

use anyhow::{Context, Result};
use shared_types::User;

use crate::auth::types::FacebookProfile;
use crate::repository::UserStore;

/// Return the local user linked to `profile`, creating one on first login.
///
/// Existing users are returned as stored; a changed display name on the
/// provider side is not copied over.
pub async fn find_or_create_user(store: &dyn UserStore, profile: &FacebookProfile) -> Result<User> {
    if let Some(user) = store
        .find_by_uid(&profile.id)
        .await
        .context("Failed to look up user")?
    {
        tracing::info!("Found a user: {}", user.id);
        return Ok(user);
    }

    let user = store
        .create(profile)
        .await
        .context("Failed to create user")?;
    tracing::info!("Created a new user: {}", user.id);
    Ok(user)
}
