use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{entity::categories::CategoryName, models::Category};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: CategoryName,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
