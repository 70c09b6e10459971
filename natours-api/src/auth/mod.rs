//! Authentication and account self-service
//!
//! Signup and login issue JWTs; [`protect`] is the middleware in front of
//! every protected route, loading the authenticated [`User`] into request
//! extensions; [`require_role`] guards role-restricted handlers. Password
//! reset works through a random token mailed to the user, of which only the
//! SHA-256 digest is stored.

pub mod password;
pub mod tokens;

use axum::{
    extract::{Path, Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

pub use password::PasswordHasher;
pub use tokens::{Claims, TokenService};

use crate::email::password_reset_message;
use crate::error::{Error, Result};
use crate::handlers::envelope::Envelope;
use crate::handlers::factory::{self, strip_hidden};
use crate::models::{Model, Role, User};
use crate::state::AppState;
use crate::store::{Document, DocumentStore, FilterCondition, ListQuery};

/// The authenticated user, injected by [`protect`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware: authenticate the request and load its user
///
/// Rejects requests without a bearer token, with an invalid or expired
/// token, for a deleted or deactivated account, and for tokens issued
/// before the user's last password change.
pub async fn protect(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&request).ok_or_else(|| {
        Error::Unauthorized("You are not logged in! Please log in to get access.".to_string())
    })?;
    let claims = state.tokens.verify(&token)?;

    let Some(doc) = state.store.find_by_id(User::COLLECTION, &claims.sub).await? else {
        return Err(Error::Unauthorized(
            "The user belonging to this token no longer exists.".to_string(),
        ));
    };
    let user = User::from_document(&doc)
        .map_err(|e| Error::Internal(format!("Malformed user document: {e}")))?;

    if !user.active {
        return Err(Error::Unauthorized(
            "The user belonging to this token no longer exists.".to_string(),
        ));
    }
    if user.changed_password_after(claims.iat) {
        return Err(Error::Unauthorized(
            "User recently changed password! Please log in again.".to_string(),
        ));
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Guard: the authenticated user must hold one of the given roles
pub fn require_role(user: &User, roles: &[Role]) -> Result<()> {
    if user.has_role(roles) {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(String::from)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// POST /api/v1/users/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<Envelope> {
    if body.password != body.password_confirm {
        return Err(Error::BadRequest("Passwords are not the same!".to_string()));
    }
    let email = body.email.trim().to_lowercase();
    let hash = state.hasher.hash(&body.password)?;

    if find_by_email(&state, &email).await?.is_some() {
        return Err(Error::BadRequest(format!(
            "Duplicate field value: {email}. Please use another value"
        )));
    }

    let doc = match json!({
        "name": body.name,
        "email": email,
        "role": "user",
        "password": hash,
        "active": true,
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    User::validate(&doc)?;
    let created = state.store.insert(User::COLLECTION, doc).await?;

    let id = created
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Internal("Created user has no identifier".to_string()))?;
    let token = state.tokens.issue(id)?;

    Ok(Envelope::created(
        User::SINGULAR,
        json!({
            "name": created.get("name"),
            "email": created.get("email"),
        }),
    )
    .with_token(token))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/v1/users/login
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<Envelope> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(Error::BadRequest(
            "Please provide email and password!".to_string(),
        ));
    }

    let email = body.email.trim().to_lowercase();
    let incorrect = || Error::Unauthorized("Incorrect email or password".to_string());

    let Some(doc) = find_by_email(&state, &email).await? else {
        return Err(incorrect());
    };
    let user = User::from_document(&doc)
        .map_err(|e| Error::Internal(format!("Malformed user document: {e}")))?;
    let Some(hash) = user.password.as_deref() else {
        return Err(incorrect());
    };
    if !user.active || !state.hasher.verify(&body.password, hash)? {
        return Err(incorrect());
    }

    let token = state.tokens.issue(&user.id)?;
    Ok(Envelope::ok().with_token(token))
}

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Envelope> {
    factory::get_one::<User, _>(state.store.as_ref(), &user.id).await
}

/// PATCH /api/v1/users/update-me
///
/// Whitelists name and email; password changes belong to their own route.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Envelope> {
    let Value::Object(body) = body else {
        return Err(Error::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };
    if body.contains_key("password") || body.contains_key("passwordConfirm") {
        return Err(Error::BadRequest(
            "This route is not for password updates. Please use /update-my-password.".to_string(),
        ));
    }

    let mut patch = Document::new();
    if let Some(name) = body.get("name") {
        patch.insert("name".to_string(), name.clone());
    }
    if let Some(email) = body.get("email").and_then(Value::as_str) {
        patch.insert(
            "email".to_string(),
            Value::String(email.trim().to_lowercase()),
        );
    }

    let updated = state
        .store
        .update(User::COLLECTION, &user.id, patch, |merged| {
            User::validate(merged).map_err(Into::into)
        })
        .await?
        .ok_or_else(|| Error::no_document(User::SINGULAR, &user.id))?;

    Ok(Envelope::item(
        User::SINGULAR,
        strip_hidden::<User>(updated),
    ))
}

/// DELETE /api/v1/users/delete-me
///
/// Deactivates the account instead of removing the document.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Envelope> {
    let mut patch = Document::new();
    patch.insert("active".to_string(), Value::Bool(false));
    state
        .store
        .update(User::COLLECTION, &user.id, patch, |merged| {
            User::validate(merged).map_err(Into::into)
        })
        .await?;
    Ok(Envelope::no_content())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordBody {
    pub password_current: String,
    pub password: String,
    pub password_confirm: String,
}

/// PATCH /api/v1/users/update-my-password
pub async fn update_my_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<UpdatePasswordBody>,
) -> Result<Envelope> {
    let Some(hash) = user.password.as_deref() else {
        return Err(Error::Internal("User has no stored password".to_string()));
    };
    if !state.hasher.verify(&body.password_current, hash)? {
        return Err(Error::Unauthorized(
            "Your current password is wrong.".to_string(),
        ));
    }
    if body.password != body.password_confirm {
        return Err(Error::BadRequest("Passwords are not the same!".to_string()));
    }

    let mut patch = Document::new();
    patch.insert(
        "password".to_string(),
        Value::String(state.hasher.hash(&body.password)?),
    );
    patch.insert(
        "passwordChangedAt".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    let updated = state
        .store
        .update(User::COLLECTION, &user.id, patch, |merged| {
            User::validate(merged).map_err(Into::into)
        })
        .await?
        .ok_or_else(|| Error::no_document(User::SINGULAR, &user.id))?;

    let token = state.tokens.issue(&user.id)?;
    Ok(Envelope::item(User::SINGULAR, strip_hidden::<User>(updated)).with_token(token))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
    pub email: String,
}

/// POST /api/v1/users/forgot-password
///
/// Mails a reset link carrying the raw token; only the digest is stored.
/// If the mail cannot be sent the token is discarded again, so a broken
/// relay never leaves a live reset token behind.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> Result<Envelope> {
    let email = body.email.trim().to_lowercase();
    let Some(doc) = find_by_email(&state, &email).await? else {
        return Err(Error::NotFound(
            "There is no user with that email address.".to_string(),
        ));
    };
    let user_id = doc
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Internal("User document has no identifier".to_string()))?
        .to_string();

    let token = generate_reset_token();
    let expires = Utc::now() + Duration::minutes(state.config.auth.reset_token_ttl_minutes as i64);

    let mut patch = Document::new();
    patch.insert(
        "passwordResetToken".to_string(),
        Value::String(hash_reset_token(&token)),
    );
    patch.insert(
        "passwordResetExpires".to_string(),
        Value::String(expires.to_rfc3339()),
    );
    state
        .store
        .update(User::COLLECTION, &user_id, patch, |merged| {
            User::validate(merged).map_err(Into::into)
        })
        .await?;

    let reset_url = format!(
        "{}/api/v1/users/reset-password/{token}",
        state.config.service.public_url.trim_end_matches('/')
    );
    let (subject, message) = password_reset_message(&reset_url);
    if let Err(err) = state.mailer.send(&email, &subject, &message).await {
        // Do not leave a live reset token behind a failed delivery
        let mut rollback = Document::new();
        rollback.insert("passwordResetToken".to_string(), Value::Null);
        rollback.insert("passwordResetExpires".to_string(), Value::Null);
        state
            .store
            .update(User::COLLECTION, &user_id, rollback, |merged| {
                User::validate(merged).map_err(Into::into)
            })
            .await?;
        return Err(err);
    }

    Ok(Envelope::ok_message("Token sent to email!"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    pub password: String,
    pub password_confirm: String,
}

/// PATCH /api/v1/users/reset-password/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<Envelope> {
    let invalid = || Error::BadRequest("Token is invalid or has expired".to_string());

    let query = ListQuery {
        filter: vec![FilterCondition::eq(
            "passwordResetToken",
            hash_reset_token(&token),
        )],
        ..ListQuery::default()
    };
    let mut matches = state.store.find(User::COLLECTION, &query).await?;
    let Some(doc) = matches.pop() else {
        return Err(invalid());
    };
    let user = User::from_document(&doc)
        .map_err(|e| Error::Internal(format!("Malformed user document: {e}")))?;
    match user.password_reset_expires {
        Some(expires) if expires > Utc::now() => {}
        _ => return Err(invalid()),
    }

    if body.password != body.password_confirm {
        return Err(Error::BadRequest("Passwords are not the same!".to_string()));
    }

    let mut patch = Document::new();
    patch.insert(
        "password".to_string(),
        Value::String(state.hasher.hash(&body.password)?),
    );
    patch.insert(
        "passwordChangedAt".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    patch.insert("passwordResetToken".to_string(), Value::Null);
    patch.insert("passwordResetExpires".to_string(), Value::Null);
    state
        .store
        .update(User::COLLECTION, &user.id, patch, |merged| {
            User::validate(merged).map_err(Into::into)
        })
        .await?;

    let token = state.tokens.issue(&user.id)?;
    Ok(Envelope::ok().with_token(token))
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<Document>> {
    let query = ListQuery {
        filter: vec![FilterCondition::eq("email", email)],
        ..ListQuery::default()
    };
    let mut matches = state.store.find(User::COLLECTION, &query).await?;
    Ok(matches.pop())
}

fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex_encode(&bytes)
}

/// Digest a raw reset token the way it is stored
pub(crate) fn hash_reset_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use crate::config::Config;

    use super::*;

    fn test_state() -> AppState {
        AppState::new(Config::default()).unwrap()
    }

    fn signup_body(name: &str, email: &str) -> SignupBody {
        SignupBody {
            name: name.to_string(),
            email: email.to_string(),
            password: "pass1234".to_string(),
            password_confirm: "pass1234".to_string(),
        }
    }

    fn body_of(envelope: &Envelope) -> Value {
        serde_json::to_value(envelope).unwrap()
    }

    async fn stored_user(state: &AppState, email: &str) -> User {
        let doc = find_by_email(state, email).await.unwrap().unwrap();
        User::from_document(&doc).unwrap()
    }

    #[tokio::test]
    async fn test_signup_issues_token_and_hides_password() {
        let state = test_state();
        let envelope = signup(
            State(state.clone()),
            Json(signup_body("Ada", "Ada@Example.com")),
        )
        .await
        .unwrap();

        assert_eq!(envelope.status_code(), StatusCode::CREATED);
        let body = body_of(&envelope);
        assert!(body["token"].as_str().is_some());
        // Email was normalized to lowercase
        assert_eq!(body["data"]["user"]["email"], "ada@example.com");
        assert!(body["data"]["user"].get("password").is_none());

        let user = stored_user(&state, "ada@example.com").await;
        assert!(user.password.unwrap().starts_with("$argon2id$"));
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn test_signup_rejects_mismatched_passwords() {
        let state = test_state();
        let mut body = signup_body("Ada", "ada@example.com");
        body.password_confirm = "different".to_string();
        let err = signup(State(state), Json(body)).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords are not the same!");
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_email() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let err = signup(State(state), Json(signup_body("Eva", "ada@example.com")))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Duplicate field value"));
    }

    #[tokio::test]
    async fn test_login_roundtrip() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();

        let envelope = login(
            State(state.clone()),
            Json(LoginBody {
                email: "ada@example.com".to_string(),
                password: "pass1234".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(body_of(&envelope)["token"].as_str().is_some());

        let err = login(
            State(state.clone()),
            Json(LoginBody {
                email: "ada@example.com".to_string(),
                password: "wrong-password".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Incorrect email or password");

        let err = login(
            State(state),
            Json(LoginBody {
                email: String::new(),
                password: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Please provide email and password!");
    }

    #[tokio::test]
    async fn test_protect_middleware() {
        let state = test_state();
        let envelope = signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let token = body_of(&envelope)["token"].as_str().unwrap().to_string();

        async fn private(Extension(CurrentUser(user)): Extension<CurrentUser>) -> String {
            user.name
        }
        let app = Router::new()
            .route("/private", get(private))
            .route_layer(from_fn_with_state(state.clone(), protect))
            .with_state(state);

        // No token
        let response = app
            .clone()
            .oneshot(HttpRequest::get("/private").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Tampered token
        let response = app
            .clone()
            .oneshot(
                HttpRequest::get("/private")
                    .header("authorization", format!("Bearer {token}x"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Valid token
        let response = app
            .oneshot(
                HttpRequest::get("/private")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protect_rejects_token_issued_before_password_change() {
        let state = test_state();
        let envelope = signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let token = body_of(&envelope)["token"].as_str().unwrap().to_string();
        let user = stored_user(&state, "ada@example.com").await;

        // Password changed well after the token was issued
        let mut patch = Document::new();
        patch.insert(
            "passwordChangedAt".to_string(),
            Value::String((Utc::now() + Duration::hours(1)).to_rfc3339()),
        );
        state
            .store
            .update(User::COLLECTION, &user.id, patch, |_| Ok(()))
            .await
            .unwrap();

        async fn private() -> &'static str {
            "ok"
        }
        let app = Router::new()
            .route("/private", get(private))
            .route_layer(from_fn_with_state(state.clone(), protect))
            .with_state(state);
        let response = app
            .oneshot(
                HttpRequest::get("/private")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_role() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let user = stored_user(&state, "ada@example.com").await;

        assert!(require_role(&user, &[Role::User]).is_ok());
        let err = require_role(&user, &[Role::Admin, Role::LeadGuide]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "You do not have permission to perform this action"
        );
    }

    #[tokio::test]
    async fn test_update_me_whitelists_fields() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let user = stored_user(&state, "ada@example.com").await;

        let err = update_me(
            State(state.clone()),
            Extension(CurrentUser(user.clone())),
            Json(json!({"password": "sneaky123"})),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("not for password updates"));

        let envelope = update_me(
            State(state.clone()),
            Extension(CurrentUser(user.clone())),
            Json(json!({"name": "Ada Lovelace", "role": "admin"})),
        )
        .await
        .unwrap();
        let body = body_of(&envelope);
        assert_eq!(body["data"]["user"]["name"], "Ada Lovelace");

        // The role field was not whitelisted through
        let stored = stored_user(&state, "ada@example.com").await;
        assert_eq!(stored.role, Role::User);
    }

    #[tokio::test]
    async fn test_delete_me_deactivates_account() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let user = stored_user(&state, "ada@example.com").await;

        let envelope = delete_me(State(state.clone()), Extension(CurrentUser(user)))
            .await
            .unwrap();
        assert_eq!(envelope.status_code(), StatusCode::NO_CONTENT);

        // The account still exists but can no longer log in
        let stored = stored_user(&state, "ada@example.com").await;
        assert!(!stored.active);
        let err = login(
            State(state),
            Json(LoginBody {
                email: "ada@example.com".to_string(),
                password: "pass1234".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_update_my_password_flow() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let user = stored_user(&state, "ada@example.com").await;

        let err = update_my_password(
            State(state.clone()),
            Extension(CurrentUser(user.clone())),
            Json(UpdatePasswordBody {
                password_current: "wrong".to_string(),
                password: "newpass123".to_string(),
                password_confirm: "newpass123".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Your current password is wrong.");

        let envelope = update_my_password(
            State(state.clone()),
            Extension(CurrentUser(user)),
            Json(UpdatePasswordBody {
                password_current: "pass1234".to_string(),
                password: "newpass123".to_string(),
                password_confirm: "newpass123".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(body_of(&envelope)["token"].as_str().is_some());

        // The new password logs in, the old one does not
        assert!(login(
            State(state.clone()),
            Json(LoginBody {
                email: "ada@example.com".to_string(),
                password: "newpass123".to_string(),
            }),
        )
        .await
        .is_ok());
        assert!(login(
            State(state),
            Json(LoginBody {
                email: "ada@example.com".to_string(),
                password: "pass1234".to_string(),
            }),
        )
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_forgot_password_stores_digest_not_token() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();

        let envelope = forgot_password(
            State(state.clone()),
            Json(ForgotPasswordBody {
                email: "ada@example.com".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            body_of(&envelope)["message"],
            "Token sent to email!"
        );

        let user = stored_user(&state, "ada@example.com").await;
        let digest = user.password_reset_token.unwrap();
        // SHA-256 hex digest, not a raw token
        assert_eq!(digest.len(), 64);
        assert!(user.password_reset_expires.unwrap() > Utc::now());

        let err = forgot_password(
            State(state),
            Json(ForgotPasswordBody {
                email: "nobody@example.com".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "There is no user with that email address.");
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let user = stored_user(&state, "ada@example.com").await;

        // Plant a known token the way forgot_password would
        let raw_token = "a-known-reset-token";
        let mut patch = Document::new();
        patch.insert(
            "passwordResetToken".to_string(),
            Value::String(hash_reset_token(raw_token)),
        );
        patch.insert(
            "passwordResetExpires".to_string(),
            Value::String((Utc::now() + Duration::minutes(10)).to_rfc3339()),
        );
        state
            .store
            .update(User::COLLECTION, &user.id, patch, |_| Ok(()))
            .await
            .unwrap();

        let err = reset_password(
            State(state.clone()),
            Path("wrong-token".to_string()),
            Json(ResetPasswordBody {
                password: "resetpass1".to_string(),
                password_confirm: "resetpass1".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Token is invalid or has expired");

        let envelope = reset_password(
            State(state.clone()),
            Path(raw_token.to_string()),
            Json(ResetPasswordBody {
                password: "resetpass1".to_string(),
                password_confirm: "resetpass1".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(body_of(&envelope)["token"].as_str().is_some());

        // Token fields were cleared; the new password works
        let stored = stored_user(&state, "ada@example.com").await;
        assert!(stored.password_reset_token.is_none());
        assert!(stored.password_reset_expires.is_none());
        assert!(login(
            State(state.clone()),
            Json(LoginBody {
                email: "ada@example.com".to_string(),
                password: "resetpass1".to_string(),
            }),
        )
        .await
        .is_ok());

        // The token is single-use
        let err = reset_password(
            State(state),
            Path(raw_token.to_string()),
            Json(ResetPasswordBody {
                password: "another123".to_string(),
                password_confirm: "another123".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Token is invalid or has expired");
    }

    #[tokio::test]
    async fn test_expired_reset_token_rejected() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_body("Ada", "ada@example.com")))
            .await
            .unwrap();
        let user = stored_user(&state, "ada@example.com").await;

        let raw_token = "expired-token";
        let mut patch = Document::new();
        patch.insert(
            "passwordResetToken".to_string(),
            Value::String(hash_reset_token(raw_token)),
        );
        patch.insert(
            "passwordResetExpires".to_string(),
            Value::String((Utc::now() - Duration::minutes(1)).to_rfc3339()),
        );
        state
            .store
            .update(User::COLLECTION, &user.id, patch, |_| Ok(()))
            .await
            .unwrap();

        let err = reset_password(
            State(state),
            Path(raw_token.to_string()),
            Json(ResetPasswordBody {
                password: "resetpass1".to_string(),
                password_confirm: "resetpass1".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Token is invalid or has expired");
    }
}
