use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profiles::UserProfile;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}

/// Current user joined with their profile row. Consumers read auth and
/// profile state from this one response instead of per-view queries.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub profile: Option<UserProfile>,
}

/// Irreversible account deletion must be explicitly confirmed.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub confirm: bool,
}
