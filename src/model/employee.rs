use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "EMP-001",
        "name": "John Doe",
        "email": "john.doe@company.com",
        "role": "engineer",
        "ratings_sheet_link": null
    })
)]
pub struct Employee {
    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "engineer", nullable = true)]
    pub role: Option<String>,

    #[schema(nullable = true)]
    pub ratings_sheet_link: Option<String>,
}
