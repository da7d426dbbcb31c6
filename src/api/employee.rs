use crate::{
    auth::auth::AuthUser,
    model::employee::Employee,
    store::{AttendanceStore, MySqlStore},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = "engineer")]
    pub role: Option<String>,
    pub ratings_sheet_link: Option<String>,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing required fields"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Employee already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    if payload.employee_id.trim().is_empty() || payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "employee_id, name and email are required"
        })));
    }

    let employee = store
        .create_employee(Employee {
            employee_id: payload.employee_id.trim().to_string(),
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            role: payload.role,
            ratings_sheet_link: payload.ratings_sheet_link,
        })
        .await?;

    info!(employee_id = %employee.employee_id, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    responses(
        (status = 200, description = "All employees", body = [Employee])
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(store: web::Data<MySqlStore>) -> actix_web::Result<impl Responder> {
    let employees = store.list_employees().await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    store: web::Data<MySqlStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    match store.get_employee(&employee_id).await? {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    if !store.delete_employee(&employee_id).await? {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    info!(employee_id = %employee_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
