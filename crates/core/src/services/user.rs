//! Account profiles.

use chrono::Utc;
use cyberguard_common::{AppError, AppResult};
use cyberguard_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for editing one's own profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 1024))]
    pub address: Option<String>,
}

/// Fail unless `user` is an official.
pub fn require_official(user: &user::Model) -> AppResult<()> {
    if user.is_official() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Officials only".to_string()))
    }
}

/// Fail unless `viewer` is `owner_id` or an official.
pub fn require_self_or_official(viewer: &user::Model, owner_id: &str) -> AppResult<()> {
    if viewer.id == owner_id || viewer.is_official() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only view your own records".to_string(),
        ))
    }
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Fetch a profile. Citizens may only fetch their own.
    pub async fn get_profile(&self, id: &str, viewer: &user::Model) -> AppResult<user::Model> {
        require_self_or_official(viewer, id)?;
        if viewer.id == id {
            return Ok(viewer.clone());
        }
        self.user_repo.get_by_id(id).await
    }

    /// Update name and address. Identity fields are fixed after registration.
    pub async fn update_profile(
        &self,
        user: user::Model,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let name = input.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let address = input
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        if name.is_none() && address.is_none() {
            return Ok(user);
        }

        let mut active: user::ActiveModel = user.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(address) = address {
            active.address = Set(address);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }
}
