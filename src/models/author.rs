//! Author model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Author row. Natural key is `(name, lastname)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub lastname: String,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.lastname)
    }
}
