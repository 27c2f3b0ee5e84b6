//! Directory users

use bridge_traits::http::HttpMethod;
use tracing::{info, instrument};

use crate::client::GraphClient;
use crate::error::{GraphError, Result};
use crate::query::ODataQuery;
use crate::response::{ensure_success, parse_json, ErrorContext};
use crate::scope::segment;
use crate::types::{Collection, User};

const READ_USERS: ErrorContext = ErrorContext::new("read users", "User.Read.All or Directory.Read.All");

/// Parameters for [`Users::list_users`]
#[derive(Debug, Clone, Default)]
pub struct ListUsersParams {
    pub select: Option<String>,
    pub filter: Option<String>,
    pub search: Option<String>,
    pub orderby: Option<String>,
    pub top: Option<u32>,
}

pub struct Users<'a> {
    client: &'a GraphClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a GraphClient) -> Self {
        Self { client }
    }

    /// `GET /users`
    ///
    /// `$search` requires advanced query support, so it also sends
    /// `ConsistencyLevel: eventual`.
    #[instrument(skip(self))]
    pub async fn list_users(&self, params: &ListUsersParams) -> Result<Collection<User>> {
        let query = ODataQuery::new()
            .select(params.select.as_deref())
            .filter(params.filter.as_deref())
            .search(params.search.as_deref())
            .orderby(params.orderby.as_deref())
            .top(params.top);

        let mut request = self.client.request(HttpMethod::Get, "/users");
        if query.get("$search").is_some() {
            request = request.header("ConsistencyLevel", "eventual");
        }
        let request = request.query_pairs(query.into_pairs());

        let response = ensure_success(self.client.send(request).await?, &READ_USERS)?;
        let users: Collection<User> = parse_json(&response)?;

        info!(count = users.value.len(), more = users.next_link.is_some(), "Listed users");
        Ok(users)
    }

    /// `GET /users/{id}`; `user_id` may be an object id or a principal name
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str, select: Option<&str>) -> Result<User> {
        if user_id.trim().is_empty() {
            return Err(GraphError::validation("user_id must not be empty"));
        }

        let request = self
            .client
            .request(HttpMethod::Get, &format!("/users/{}", segment(user_id)))
            .query_pairs(ODataQuery::new().select(select).into_pairs());

        let response = ensure_success(self.client.send(request).await?, &READ_USERS)?;
        parse_json(&response)
    }
}
