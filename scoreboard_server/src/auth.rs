use argon2::Argon2;
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, StatusCode},
    routing::post,
    Json, Router, TypedHeader,
};
use base64::Engine;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::{thread_rng, Rng};
use scoreboard_entities::{
    domain::referee::{Referee, ADMIN_USERNAME},
    prelude::CompetitionInfo,
    schema::access_key,
    ValidationError,
};
use sea_orm::{prelude::*, ActiveValue, DatabaseConnection, IntoActiveModel};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{response::{handle_error, APIError}, state::AppState};

const KEY_SALT: &str = "c2NvcmVib2FyZHNhbHQ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Referee,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Referee => "referee",
        }
    }

    fn from_stored(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "referee" => Some(Role::Referee),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub role: Role,
    pub username: String,
    pub sub_event_id: Option<Uuid>,
    key_hash: String,
}

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<(), APIError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Referee => Err(APIError::new_with_status(StatusCode::FORBIDDEN, "Only the administrator may do this")),
        }
    }

    /// Admins may write everywhere, referees only to their own sub-event.
    pub fn check_can_write_sub_event(&self, sub_event_id: Uuid) -> Result<(), APIError> {
        match (self.role, self.sub_event_id) {
            (Role::Admin, _) => Ok(()),
            (Role::Referee, Some(assigned)) if assigned == sub_event_id => Ok(()),
            (Role::Referee, _) => Err(APIError::new_with_status(StatusCode::FORBIDDEN, "You are not assigned to this sub-event")),
        }
    }
}

pub struct ExtractAuthenticatedUser(pub AuthenticatedUser);

fn hash_key(key: &[u8]) -> Result<String, password_hash::Error> {
    let salt = SaltString::from_b64(KEY_SALT)?;
    Ok(Argon2::default().hash_password(key, &salt)?.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for ExtractAuthenticatedUser
{
    type Rejection = APIError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(bearer_header) = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await.map_err(|_| {
                (StatusCode::UNAUTHORIZED, "No valid authorization header found")
            })?;
        let key = base64::engine::general_purpose::STANDARD_NO_PAD.decode(bearer_header.0.token())
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Bearer token invalid"))?;
        let hashed_key = hash_key(&key).map_err(|_| (StatusCode::UNAUTHORIZED, "Bearer token invalid"))?;

        let key = access_key::Entity::find_by_id(hashed_key).one(&state.db).await?;
        let key = key.ok_or((StatusCode::UNAUTHORIZED, "Bearer token invalid"))?;
        let role = Role::from_stored(&key.role).ok_or((StatusCode::UNAUTHORIZED, "Bearer token invalid"))?;

        Ok(ExtractAuthenticatedUser(AuthenticatedUser {
            role,
            username: key.username,
            sub_event_id: key.sub_event_id,
            key_hash: key.key_hash,
        }))
    }
}

pub fn hash_password(pwd: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut thread_rng());
    let pwd = Argon2::default().hash_password(pwd.as_bytes(), &salt)?;
    Ok(pwd.to_string())
}

pub fn verify_password(hash: &str, pwd: &str) -> bool {
    let Ok(password_hash) = PasswordHash::new(hash) else {
        warn!("Stored password hash is malformed");
        return false;
    };
    let algs: &[&dyn PasswordVerifier] = &[&Argon2::default()];
    password_hash.verify_password(algs, pwd).is_ok()
}

pub fn create_key(key: &[u8], role: Role, username: &str, sub_event_id: Option<Uuid>) -> Result<access_key::Model, password_hash::Error> {
    Ok(access_key::Model {
        key_hash: hash_key(key)?,
        role: role.as_str().to_string(),
        username: username.to_string(),
        sub_event_id,
        created_at: chrono::Utc::now().naive_utc(),
    })
}

/// Issues a fresh bearer token and stores its hash.
pub async fn issue_token(db: &DatabaseConnection, role: Role, username: &str, sub_event_id: Option<Uuid>) -> Result<String, APIError> {
    let key: [u8; 32] = thread_rng().gen::<[u8; 32]>();
    let model = create_key(&key, role, username, sub_event_id).map_err(handle_error)?;
    model.into_active_model().insert(db).await?;
    Ok(base64::engine::general_purpose::STANDARD_NO_PAD.encode(key))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub role: Role,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_event_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: SessionUser,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

pub async fn login_handler(
    State(db): State<DatabaseConnection>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, APIError> {
    let invalid = || APIError::new_with_status(StatusCode::UNAUTHORIZED, "Invalid credentials");

    let user = if request.username == ADMIN_USERNAME {
        let hash = CompetitionInfo::admin_password_hash(&db).await?.ok_or_else(invalid)?;
        if !verify_password(&hash, &request.password) {
            return Err(invalid());
        }
        SessionUser { role: Role::Admin, username: ADMIN_USERNAME.to_string(), assigned_event_id: None }
    } else {
        let (referee, hash) = Referee::find_by_username(&db, request.username.trim()).await?.ok_or_else(invalid)?;
        if !verify_password(&hash, &request.password) {
            return Err(invalid());
        }
        SessionUser { role: Role::Referee, username: referee.username, assigned_event_id: Some(referee.sub_event_id) }
    };

    let token = issue_token(&db, user.role, &user.username, user.assigned_event_id).await?;
    info!(username = %user.username, role = user.role.as_str(), "Logged in");
    Ok(Json(LoginResponse { user, token }))
}

pub async fn logout_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
) -> Result<StatusCode, APIError> {
    access_key::Entity::delete_by_id(user.key_hash.clone()).exec(&db).await?;
    info!(username = %user.username, "Logged out");
    Ok(StatusCode::OK)
}

pub async fn change_admin_password_handler(
    State(db): State<DatabaseConnection>,
    ExtractAuthenticatedUser(user): ExtractAuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, APIError> {
    user.require_admin()?;
    if request.password.is_empty() {
        return Err(scoreboard_entities::ScoreboardError::from(ValidationError::new("password", "Password must not be empty")).into());
    }
    let hash = hash_password(&request.password).map_err(handle_error)?;
    CompetitionInfo::set_admin_password_hash(&db, hash).await?;

    access_key::Entity::delete_many()
        .filter(access_key::Column::Role.eq(Role::Admin.as_str()))
        .filter(access_key::Column::KeyHash.ne(user.key_hash.clone()))
        .exec(&db)
        .await?;
    info!("Admin password changed");
    Ok(StatusCode::OK)
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/admin/password", post(change_admin_password_handler))
}
