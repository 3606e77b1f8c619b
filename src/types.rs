use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier: the 24-character hex form of a MongoDB ObjectId.
pub type UserId = String;

/// A platform user as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a user. Build with
/// [`crate::validation::validate_new_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Fields a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Email,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortField::Name),
            "email" => Some(SortField::Email),
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }

    /// Stored document key.
    pub fn key(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub sort: Option<SortField>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: None,
        }
    }
}

impl ListParams {
    /// Number of records before the requested page. Saturates for pages
    /// far past the end of any collection.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub pages: u64,
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(total: u64, params: &ListParams) -> Self {
        Self {
            total,
            pages: total.div_ceil(params.limit),
            page: params.page,
            limit: params.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_rounds_pages_up() {
        let params = ListParams {
            page: 2,
            limit: 10,
            sort: None,
        };
        let p = Pagination::new(21, &params);
        assert_eq!(p.pages, 3);
        assert_eq!(p.page, 2);
        assert_eq!(params.skip(), 10);

        assert_eq!(Pagination::new(0, &params).pages, 0);
        assert_eq!(Pagination::new(10, &params).pages, 1);
    }

    #[test]
    fn test_skip_saturates_on_huge_page() {
        let params = ListParams {
            page: u64::MAX,
            limit: 100,
            sort: None,
        };
        assert_eq!(params.skip(), u64::MAX);

        let p = Pagination::new(3, &params);
        assert_eq!(p.page, u64::MAX);
        assert_eq!(p.pages, 1);
    }

    #[test]
    fn test_user_serializes_with_api_field_names() {
        let now = Utc::now();
        let user = User {
            id: "60d725b4e2f7c91234567890".to_string(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], "60d725b4e2f7c91234567890");
        assert_eq!(json["isActive"], true);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("is_active").is_none());
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(SortField::parse("createdAt"), Some(SortField::CreatedAt));
        assert_eq!(SortField::parse("email").map(|f| f.key()), Some("email"));
        assert_eq!(SortField::parse("password"), None);
    }
}
