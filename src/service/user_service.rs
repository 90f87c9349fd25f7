use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::AdminUserConfig;
use crate::model::user::User;
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtError, JwtTokenUtils, Subject, TokenPair};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};
use crate::util::session::ADMIN_ROLE;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithoutPassword {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: Option<String>,
}

impl From<User> for UserWithoutPassword {
    fn from(user: User) -> Self {
        UserWithoutPassword {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAuthResponse {
    pub user: UserWithoutPassword,
    pub tokens: TokenPair,
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<UserAuthResponse, ServiceError>;
    /// New pair for a valid refresh token. The login time is carried over.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ServiceError>;
    /// Create the configured admin unless an account with that email exists.
    async fn ensure_admin(&self, admin: &AdminUserConfig) -> Result<(), ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>, jwt_utils: Arc<dyn JwtTokenUtils>) -> Self {
        Self { user_repo, jwt_utils }
    }
}

fn jwt_failure(e: JwtError) -> ServiceError {
    ServiceError::InternalError(format!("JWT error: {}", e))
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &str, password: &str) -> Result<UserAuthResponse, ServiceError> {
        info!("Admin login attempt");
        let email = email.trim().to_lowercase();
        let user = match self.user_repo.find_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("No account for login email");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
            Err(e) => {
                error!("Failed to fetch user for login: {e}");
                return Err(e.into());
            }
        };

        let valid = PasswordUtilsImpl::verify_password(password, &user.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("Password verify error: {}", e)))?;
        if !valid {
            warn!("Invalid credentials");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user_id = user.id.map(|id| id.to_hex()).unwrap_or_default();
        let tokens = self
            .jwt_utils
            .generate_token_pair(&Subject { user_id: &user_id, email: &user.email, role: &user.role }, None)
            .map_err(jwt_failure)?;
        info!("Admin logged in successfully");
        Ok(UserAuthResponse { user: user.into(), tokens })
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.jwt_utils.validate_refresh_token(refresh_token).map_err(|e| {
            warn!("Rejected refresh token: {}", e);
            ServiceError::Unauthorized(format!("Invalid refresh token: {}", e))
        })?;
        let tokens = self
            .jwt_utils
            .generate_token_pair(
                &Subject { user_id: &claims.sub, email: &claims.email, role: &claims.role },
                Some(claims.auth_time),
            )
            .map_err(jwt_failure)?;
        info!("Token refreshed successfully");
        Ok(tokens)
    }

    #[instrument(skip(self, admin), fields(email = %admin.email))]
    async fn ensure_admin(&self, admin: &AdminUserConfig) -> Result<(), ServiceError> {
        let email = admin.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            info!("Admin account already present");
            return Ok(());
        }
        let password_hash = PasswordUtilsImpl::hash_password(&admin.password)
            .map_err(|e| ServiceError::InternalError(format!("Password hash error: {}", e)))?;
        self.user_repo
            .insert(User {
                id: None,
                username: admin.username.clone(),
                email,
                password_hash,
                role: ADMIN_ROLE.to_string(),
                created_at: None,
                updated_at: None,
            })
            .await?;
        info!("Admin account created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::repository::repository_error::RepositoryResult;
    use crate::util::jwt::JwtTokenUtilsImpl;
    use bson::oid::ObjectId;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MemoryUsers {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserRepository for MemoryUsers {
        async fn insert(&self, mut user: User) -> RepositoryResult<User> {
            user.id = Some(ObjectId::new());
            self.users.lock().push(user.clone());
            Ok(user)
        }

        async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
            Ok(self.users.lock().iter().find(|u| u.email == email).cloned())
        }
    }

    fn admin() -> AdminUserConfig {
        AdminUserConfig {
            username: "admin".to_string(),
            email: "Admin@BCM.test".to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    fn service(repo: Arc<MemoryUsers>) -> UserServiceImpl {
        UserServiceImpl::new(repo, Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default())))
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let repo = Arc::new(MemoryUsers::default());
        let service = service(repo.clone());
        service.ensure_admin(&admin()).await.unwrap();
        service.ensure_admin(&admin()).await.unwrap();
        let users = repo.users.lock();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "admin@bcm.test");
        assert_eq!(users[0].role, ADMIN_ROLE);
        assert_ne!(users[0].password_hash, "s3cret-pass");
    }

    #[tokio::test]
    async fn test_login_and_refresh_keep_auth_time() {
        let service = service(Arc::new(MemoryUsers::default()));
        service.ensure_admin(&admin()).await.unwrap();

        let auth = service.login("admin@bcm.test", "s3cret-pass").await.unwrap();
        assert_eq!(auth.user.role, ADMIN_ROLE);
        let original = service.jwt_utils.validate_access_token(&auth.tokens.access_token).unwrap();

        let refreshed = service.refresh_token(&auth.tokens.refresh_token).await.unwrap();
        let claims = service.jwt_utils.validate_access_token(&refreshed.access_token).unwrap();
        assert_eq!(claims.auth_time, original.auth_time);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let service = service(Arc::new(MemoryUsers::default()));
        service.ensure_admin(&admin()).await.unwrap();
        assert!(matches!(
            service.login("admin@bcm.test", "wrong").await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            service.login("nobody@bcm.test", "s3cret-pass").await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let service = service(Arc::new(MemoryUsers::default()));
        service.ensure_admin(&admin()).await.unwrap();
        let auth = service.login("admin@bcm.test", "s3cret-pass").await.unwrap();
        assert!(service.refresh_token(&auth.tokens.access_token).await.is_err());
    }
}
