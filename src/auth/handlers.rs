use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    model::{role::Role, user::User},
    models::{LoginReqDto, LoginResponse, RegisterReq},
    store::{AttendanceStore, MySqlStore, StoreError},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

/// Admin creates a login, optionally linked to an employee.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = Object, example = json!({
            "message": "User registered successfully"
        })),
        (status = 400, description = "Username and password must not be empty"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(auth, store, payload), fields(username = %payload.username))]
pub async fn register(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<RegisterReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Username and password must not be empty"
        })));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let role = if payload.admin { Role::Admin } else { Role::Member };

    let user_id = match store
        .create_user(username, &hashed, role, payload.employee_id.as_deref())
        .await
    {
        Ok(id) => id,
        Err(StoreError::WriteConflict(_)) => {
            return Ok(HttpResponse::Conflict().json(json!({
                "error": "Username already exists or employee is unknown"
            })));
        }
        Err(e) => {
            error!(error = %e, "Failed to register user");
            return Err(e.into());
        }
    };

    info!(user_id, "User registered");
    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Username or password required"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().body("Username or password required");
    }

    debug!("Fetching user from database");

    let db_user = match sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, role_id, employee_id
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(user.username.trim())
    .fetch_optional(store.pool())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    let Some(role) = Role::from_id(db_user.role_id) else {
        error!(role_id = db_user.role_id, "User has unknown role");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    };

    let access_token = match generate_access_token(
        db_user.id,
        db_user.username,
        role,
        db_user.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    })
}
