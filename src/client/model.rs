use serde::Deserialize;
use validator::Validate;

pub use crate::models::Client;

/// Body of client create and update requests
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientRequest {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub phone: Option<String>,
}

impl ClientRequest {
    /// Trim text fields and drop a blank phone number
    pub fn normalized(self) -> Self {
        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone,
        }
    }
}

/// Column a client search is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Email,
    Phone,
    #[default]
    #[serde(other)]
    Any,
}

#[derive(Debug, Deserialize)]
pub struct ClientSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub field: SearchField,
}
