use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::auth::{
    dto::{
        LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, RegisterResponse,
        UpdateProfileRequest,
    },
    error::ServiceError,
    jwt::TokenService,
    password::{CredentialHasher, HashedPassword},
    repo::UserStore,
    repo_types::{NewUser, StoreError, UserChanges, UserProfile},
    validation,
};

/// Register, login and profile use cases.
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<TokenService>,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Hashing is CPU-bound, so it runs on the blocking pool.
    async fn hash_password(&self, plain: &str) -> Result<HashedPassword, ServiceError> {
        let hasher = Arc::clone(&self.hasher);
        let plain = plain.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        hashed.map_err(|e| {
            error!(error = %e, "hash_password failed");
            ServiceError::from(e)
        })
    }

    async fn compare_password(
        &self,
        hashed: HashedPassword,
        plain: &str,
    ) -> Result<bool, ServiceError> {
        let hasher = Arc::clone(&self.hasher);
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hasher.compare(&hashed, &plain))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    #[instrument(skip_all, fields(phone_number = %req.phone_number))]
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ServiceError> {
        if let Err(e) =
            validation::validate_registration(&req.full_name, &req.password, &req.phone_number)
        {
            warn!(reason = %e, "invalid registration");
            return Err(e.into());
        }

        let password_hash = self.hash_password(&req.password).await?;
        let id = self
            .users
            .create(NewUser {
                full_name: req.full_name,
                password_hash,
                phone_number: req.phone_number,
            })
            .await
            .map_err(|e| {
                match &e {
                    StoreError::Conflict => warn!("phone number already registered"),
                    _ => error!(error = %e, "create user failed"),
                }
                ServiceError::from(e)
            })?;

        info!(user_id = id, "user registered");
        Ok(RegisterResponse { id })
    }

    #[instrument(skip_all, fields(phone_number = %req.phone_number))]
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ServiceError> {
        if req.password.is_empty() {
            return Err(validation::ValidationError::PasswordRequired.into());
        }
        if req.phone_number.is_empty() {
            return Err(validation::ValidationError::PhoneNumberRequired.into());
        }

        let creds = match self.users.find_by_phone(&req.phone_number).await {
            Ok(c) => c,
            Err(StoreError::NotFound) => {
                warn!("login unknown phone number");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "find_by_phone failed");
                return Err(e.into());
            }
        };

        if !self.compare_password(creds.password_hash, &req.password).await? {
            warn!(user_id = creds.user_id, "login invalid password");
            return Err(ServiceError::InvalidCredentials);
        }

        let jwt = self.tokens.issue(creds.user_id).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            ServiceError::Internal(e.to_string())
        })?;

        // Secondary bookkeeping; the user is already authenticated.
        if let Err(e) = self.users.increment_login_count(creds.user_id).await {
            error!(error = %e, user_id = creds.user_id, "increment_login_count failed");
        }

        info!(user_id = creds.user_id, "user logged in");
        Ok(LoginResponse {
            id: creds.user_id,
            jwt,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: i64) -> Result<ProfileResponse, ServiceError> {
        if user_id <= 0 {
            return Err(ServiceError::Forbidden);
        }
        let profile = self.users.find_by_id(user_id).await.map_err(|e| {
            error!(error = %e, "find_by_id failed");
            identity_error(e)
        })?;
        Ok(profile.into())
    }

    #[instrument(skip(self, req))]
    pub async fn update_profile(
        &self,
        user_id: i64,
        req: UpdateProfileRequest,
    ) -> Result<ProfileResponse, ServiceError> {
        if user_id <= 0 {
            return Err(ServiceError::Forbidden);
        }

        let changes = validation::validate_update(
            req.full_name.as_deref(),
            req.password.as_deref(),
            req.phone_number.as_deref(),
        )
        .map_err(|e| {
            warn!(reason = %e, "invalid profile update");
            ServiceError::from(e)
        })?;

        let password_hash = match changes.password {
            Some(plain) => Some(self.hash_password(plain).await?),
            None => None,
        };
        let changes = UserChanges {
            full_name: changes.full_name.map(str::to_owned),
            password_hash,
            phone_number: changes.phone_number.map(str::to_owned),
        };

        let profile = self.users.update(user_id, changes).await.map_err(|e| {
            match &e {
                StoreError::Conflict => warn!("phone number already registered"),
                _ => error!(error = %e, "update user failed"),
            }
            identity_error(e)
        })?;

        info!("profile updated");
        Ok(profile.into())
    }
}

/// An authenticated id with no row behind it is treated as a bad token.
fn identity_error(e: StoreError) -> ServiceError {
    match e {
        StoreError::NotFound => ServiceError::Forbidden,
        other => other.into(),
    }
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.user_id,
            name: p.full_name,
            phone_number: p.phone_number,
        }
    }
}
