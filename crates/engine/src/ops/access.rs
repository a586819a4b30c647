use sea_orm::{ConnectionTrait, prelude::*};
use uuid::Uuid;

use crate::{Area, EngineError, Locale, Profile, ResultEngine, Role, is_authorized, landing_path, profiles};

use super::Engine;

impl Engine {
    /// Profile of the acting identity.
    ///
    /// No identity at all is `Unauthorized`; an identity without profile is
    /// `ProfileNotFound`.
    pub(super) async fn caller_profile<C: ConnectionTrait>(
        &self,
        db: &C,
        caller: Option<Uuid>,
    ) -> ResultEngine<Profile> {
        let caller = caller
            .ok_or_else(|| EngineError::Unauthorized("no authenticated identity".to_string()))?;
        self.load_profile(db, caller).await
    }

    pub(super) async fn load_profile<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<Profile> {
        let model = profiles::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::ProfileNotFound(format!("profile {user_id} not exists")))?;
        Profile::try_from(model)
    }

    /// Caller profile, refused unless it holds exactly `role`.
    pub(super) async fn require_role<C: ConnectionTrait>(
        &self,
        db: &C,
        caller: Option<Uuid>,
        role: Role,
    ) -> ResultEngine<Profile> {
        let profile = self.caller_profile(db, caller).await?;
        if !profile.has_role(role) {
            tracing::warn!(
                "{} ({}) refused: {role} role required",
                profile.username,
                profile.role_name()
            );
            return Err(EngineError::InsufficientPermissions(format!(
                "{role} role required"
            )));
        }
        Ok(profile)
    }

    /// Checks credentials against the identity provider and returns the
    /// matching profile.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Profile> {
        let identity = self
            .identities
            .authenticate(email, password)
            .await?
            .ok_or_else(|| EngineError::Unauthorized("invalid credentials".to_string()))?;
        self.load_profile(&self.database, identity).await
    }

    /// Authenticates and returns the landing path of the user's role.
    pub async fn login(&self, email: &str, password: &str, locale: Locale) -> ResultEngine<String> {
        let profile = self.authenticate(email, password).await?;
        tracing::info!("{} logged in as {}", profile.username, profile.role_name());
        Ok(landing_path(profile.role.map(Role::as_str), locale))
    }

    /// Landing path for an already authenticated caller.
    pub async fn landing_for(&self, caller: Option<Uuid>, locale: Locale) -> ResultEngine<String> {
        let profile = self.caller_profile(&self.database, caller).await?;
        Ok(landing_path(profile.role.map(Role::as_str), locale))
    }

    /// Resolves the caller and checks it may enter `area`.
    pub async fn authorize_area(&self, caller: Option<Uuid>, area: Area) -> ResultEngine<Profile> {
        let profile = self.caller_profile(&self.database, caller).await?;
        // A profile without a known role only reaches the public area.
        let allowed = match profile.role {
            Some(role) => is_authorized(role, area),
            None => area == Area::Public,
        };
        if !allowed {
            tracing::warn!(
                "{} ({}) denied {area:?} area",
                profile.username,
                profile.role_name()
            );
            return Err(EngineError::InsufficientPermissions(format!(
                "{} cannot access {}",
                profile.role_name(),
                area.path(Locale::default())
            )));
        }
        Ok(profile)
    }
}
