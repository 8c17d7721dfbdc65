use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const REMOTE_USER_HEADER: &str = "x-remote-user";
pub const REMOTE_GROUPS_HEADER: &str = "x-remote-groups";

/// Caller identity as asserted by the fronting auth layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestUser {
    pub name: String,
    pub groups: Vec<String>,
}

impl RequestUser {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn new(name: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            name: name.into(),
            groups,
        }
    }

    pub fn is_member_of_any(&self, groups: &[String]) -> bool {
        self.groups.iter().any(|g| groups.contains(g))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let name = header(REMOTE_USER_HEADER).unwrap_or(Self::ANONYMOUS).to_string();
        let groups = header(REMOTE_GROUPS_HEADER)
            .map(|v| {
                v.split(',')
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { name, groups })
    }
}
