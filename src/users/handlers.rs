use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    config::UsersConfig,
    error::ApiError,
    sessions::{Session, SessionData},
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, LOGGED_IN_MESSAGE,
            NO_SUCH_EMAIL, USER_NOT_FOUND, WRONG_PASSWORD,
        },
        model::{prepare_create, prepare_update},
        repo_types::{PublicUser, UserDetails},
    },
};

pub fn user_routes(cfg: UsersConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/login", post(login))
        .route("/:id", get(get_user).put(update_user).delete(delete_user));
    if cfg.sessions {
        router.route("/logout", post(logout))
    } else {
        router
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserDetails>, ApiError> {
    let user = if state.config.users.include_associations {
        state
            .users
            .find_with_associations(id)
            .await?
            .map(UserDetails::Nested)
    } else {
        state.users.find_by_id(id).await?.map(UserDetails::Flat)
    };

    user.map(Json).ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
}

#[instrument(skip(state, session, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    mut session: Session,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<PublicUser>), ApiError> {
    let Json(mut payload) = payload?;
    payload.email = normalize_email(&payload.email);

    let new = prepare_create(payload)?;
    let user = state.users.insert(new).await?;

    let headers = if state.config.users.sessions {
        let established = session
            .establish(SessionData {
                user_id: user.id,
                username: user.username.clone(),
                logged_in: true,
            })
            .await;
        match established {
            Ok(headers) => headers,
            Err(e) => {
                // a create that fails leaves no row behind
                if let Err(cleanup) = state.users.delete(user.id).await {
                    error!(error = %cleanup, user_id = user.id, "rollback of new user failed");
                }
                return Err(e.into());
            }
        }
    } else {
        HeaderMap::new()
    };

    info!(user_id = user.id, email = %user.email, "user created");
    Ok((headers, Json(user.into())))
}

#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::bad_request(NO_SUCH_EMAIL));
    };

    if !user.verify_password(&payload.password) {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::bad_request(WRONG_PASSWORD));
    }

    let headers = if state.config.users.sessions {
        session
            .establish(SessionData {
                user_id: user.id,
                username: user.username.clone(),
                logged_in: true,
            })
            .await?
    } else {
        HeaderMap::new()
    };

    info!(user_id = user.id, "user logged in");
    Ok((
        headers,
        Json(LoginResponse {
            user: user.into(),
            message: LOGGED_IN_MESSAGE,
        }),
    ))
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<(StatusCode, HeaderMap), ApiError> {
    if !session.is_logged_in() {
        return Err(ApiError::NoSession);
    }
    let user_id = session.data().map(|d| d.user_id);
    let headers = session.destroy().await?;
    info!(?user_id, "user logged out");
    Ok((StatusCode::NO_CONTENT, headers))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Vec<u64>>, ApiError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.as_deref().map(normalize_email);

    let patch = prepare_update(payload)?;
    let affected = state.users.update(id, patch).await?;
    if affected == 0 {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    info!(user_id = id, "user updated");
    Ok(Json(vec![affected]))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<u64>, ApiError> {
    let deleted = state.users.delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    info!(user_id = id, "user deleted");
    Ok(Json(deleted))
}
