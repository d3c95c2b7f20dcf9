//! Dashboard resource endpoints.
//!
//! These are pass-through calls: parameters go out as given and the JSON
//! body comes back as [`Value`]. Authorization is enforced by the backend;
//! the client only attaches credentials.

use serde::Serialize;
use serde_json::{json, Value};

use callboard_core::{Role, UserId};

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};

/// Query parameters as key/value pairs.
pub type Params<'a> = [(&'a str, &'a str)];

const DASHBOARD: &str = "/api/dashboard";

fn endpoint(path: &str) -> String {
    format!("{DASHBOARD}{path}")
}

fn with_params(request: ApiRequest, params: &Params<'_>) -> ApiRequest {
    request.query(params.iter().copied())
}

impl ApiClient {
    /// Agent management endpoints.
    #[must_use]
    pub const fn agents(&self) -> Agents<'_> {
        Agents { client: self }
    }

    /// Call history endpoints.
    #[must_use]
    pub const fn calls(&self) -> Calls<'_> {
        Calls { client: self }
    }

    /// Lead endpoints.
    #[must_use]
    pub const fn leads(&self) -> Leads<'_> {
        Leads { client: self }
    }

    /// Analytics endpoints.
    #[must_use]
    pub const fn analytics(&self) -> Analytics<'_> {
        Analytics { client: self }
    }

    /// User management endpoints (admin only on the backend).
    #[must_use]
    pub const fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    /// Statistics and sync status endpoints.
    #[must_use]
    pub const fn utility(&self) -> Utility<'_> {
        Utility { client: self }
    }

    /// Search endpoints.
    #[must_use]
    pub const fn search(&self) -> Search<'_> {
        Search { client: self }
    }

    /// Sync agents and calls from the telephony provider.
    ///
    /// Both syncs are issued concurrently and reported independently; one
    /// failing does not cancel the other.
    pub async fn sync_all(&self) -> SyncReport {
        let (agents_api, calls_api) = (self.agents(), self.calls());
        let (agents, calls) = tokio::join!(agents_api.sync(), calls_api.sync(None));
        tracing::info!(
            agents_ok = agents.is_ok(),
            calls_ok = calls.is_ok(),
            "Full sync finished"
        );
        SyncReport { agents, calls }
    }
}

/// Outcome of [`ApiClient::sync_all`].
#[derive(Debug)]
pub struct SyncReport {
    /// Result of the agent sync.
    pub agents: Result<Value>,
    /// Result of the call sync.
    pub calls: Result<Value>,
}

impl SyncReport {
    /// Returns `true` if both syncs succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.agents.is_ok() && self.calls.is_ok()
    }
}

/// Agent management endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Agents<'a> {
    client: &'a ApiClient,
}

impl Agents<'_> {
    /// List agents visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, params: &Params<'_>) -> Result<Value> {
        let request = with_params(ApiRequest::get(endpoint("/agents")), params);
        self.client.execute_json(request).await
    }

    /// Fetch one agent with its provider details.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, agent_id: &str) -> Result<Value> {
        let request = ApiRequest::get(endpoint(&format!("/agent-info/{agent_id}")));
        self.client.execute_json(request).await
    }

    /// Create an agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create(&self, agent: &Value) -> Result<Value> {
        let request = ApiRequest::post(endpoint("/agents")).json(agent)?;
        self.client.execute_json(request).await
    }

    /// Update an agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update(&self, agent_id: &str, agent: &Value) -> Result<Value> {
        let request = ApiRequest::put(endpoint(&format!("/agents/{agent_id}"))).json(agent)?;
        self.client.execute_json(request).await
    }

    /// Delete an agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, agent_id: &str) -> Result<Value> {
        let request = ApiRequest::delete(endpoint(&format!("/agents/{agent_id}")));
        self.client.execute_json(request).await
    }

    /// Pull agents from the telephony provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn sync(&self) -> Result<Value> {
        self.client
            .execute_json(ApiRequest::post(endpoint("/sync-agents")))
            .await
    }
}

/// Call history endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Calls<'a> {
    client: &'a ApiClient,
}

impl Calls<'_> {
    /// List calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, params: &Params<'_>) -> Result<Value> {
        let request = with_params(ApiRequest::get(endpoint("/calls")), params);
        self.client.execute_json(request).await
    }

    /// Fetch one call, including transcript and recording links.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, call_id: &str) -> Result<Value> {
        let request = ApiRequest::get(endpoint(&format!("/calls/{call_id}")));
        self.client.execute_json(request).await
    }

    /// Call history of one agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn history(&self, agent_id: &str, params: &Params<'_>) -> Result<Value> {
        let request = with_params(
            ApiRequest::get(endpoint(&format!("/call-history/{agent_id}"))),
            params,
        );
        self.client.execute_json(request).await
    }

    /// Call history across all visible agents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn all_history(&self, params: &Params<'_>) -> Result<Value> {
        let request = with_params(ApiRequest::get(endpoint("/call-history")), params);
        self.client.execute_json(request).await
    }

    /// Pull calls from the telephony provider, optionally for one agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn sync(&self, agent_id: Option<&str>) -> Result<Value> {
        let body = agent_id.map_or_else(|| json!({}), |id| json!({ "agentId": id }));
        let request = ApiRequest::post(endpoint("/sync-calls")).json(&body)?;
        self.client.execute_json(request).await
    }
}

/// Lead endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Leads<'a> {
    client: &'a ApiClient,
}

impl Leads<'_> {
    /// List leads captured by agents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, params: &Params<'_>) -> Result<Value> {
        let request = with_params(ApiRequest::get(endpoint("/leads")), params);
        self.client.execute_json(request).await
    }

    /// Delete a lead.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, lead_id: &str) -> Result<Value> {
        let request = ApiRequest::delete(endpoint(&format!("/leads/{lead_id}")));
        self.client.execute_json(request).await
    }
}

/// Analytics endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Analytics<'a> {
    client: &'a ApiClient,
}

impl Analytics<'_> {
    async fn report(&self, name: &str, params: &Params<'_>) -> Result<Value> {
        let request = with_params(
            ApiRequest::get(endpoint(&format!("/analytics/{name}"))),
            params,
        );
        self.client.execute_json(request).await
    }

    /// Totals: calls, cost, success rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn overview(&self, params: &Params<'_>) -> Result<Value> {
        self.report("overview", params).await
    }

    /// Per-agent breakdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn agents(&self, params: &Params<'_>) -> Result<Value> {
        self.report("agents", params).await
    }

    /// Call volume and duration over time.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn calls(&self, params: &Params<'_>) -> Result<Value> {
        self.report("calls", params).await
    }

    /// Sentiment distribution.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn sentiment(&self, params: &Params<'_>) -> Result<Value> {
        self.report("sentiment", params).await
    }
}

/// Editable fields of a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Assignment<'a> {
    user_id: &'a UserId,
    agent_id: &'a str,
}

/// User management endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a ApiClient,
}

impl Users<'_> {
    fn user_endpoint(user_id: &UserId, suffix: &str) -> String {
        endpoint(&format!("/users/{}{suffix}", user_id.to_path_segment()))
    }

    /// List users, filtered by `role`, `status` or `search` parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, params: &Params<'_>) -> Result<Value> {
        let request = with_params(ApiRequest::get(endpoint("/users")), params);
        self.client.execute_json(request).await
    }

    /// Fetch one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, user_id: &UserId) -> Result<Value> {
        let request = ApiRequest::get(Self::user_endpoint(user_id, ""));
        self.client.execute_json(request).await
    }

    /// Update a user's name or role.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update(&self, user_id: &UserId, update: &UserUpdate) -> Result<Value> {
        let request = ApiRequest::put(Self::user_endpoint(user_id, "")).json(update)?;
        self.client.execute_json(request).await
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, user_id: &UserId) -> Result<Value> {
        let request = ApiRequest::delete(Self::user_endpoint(user_id, ""));
        self.client.execute_json(request).await
    }

    /// Approve a pending account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn approve(&self, user_id: &UserId) -> Result<Value> {
        let request = ApiRequest::post(Self::user_endpoint(user_id, "/approve"));
        self.client.execute_json(request).await
    }

    /// Agents assigned to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_agents(&self, user_id: &UserId) -> Result<Value> {
        let request = ApiRequest::get(Self::user_endpoint(user_id, "/agents"));
        self.client.execute_json(request).await
    }

    /// Assign an agent to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn assign_agent(&self, user_id: &UserId, agent_id: &str) -> Result<Value> {
        let body = Assignment { user_id, agent_id };
        let request = ApiRequest::post(endpoint("/assignments")).json(&body)?;
        self.client.execute_json(request).await
    }

    /// Remove an agent assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn unassign_agent(&self, user_id: &UserId, agent_id: &str) -> Result<Value> {
        let body = Assignment { user_id, agent_id };
        let request = ApiRequest::delete(endpoint("/assignments")).json(&body)?;
        self.client.execute_json(request).await
    }
}

/// Statistics and sync status endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Utility<'a> {
    client: &'a ApiClient,
}

impl Utility<'_> {
    /// Headline dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stats(&self) -> Result<Value> {
        self.client
            .execute_json(ApiRequest::get(endpoint("/stats")))
            .await
    }

    /// Progress of the last provider sync.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn sync_status(&self) -> Result<Value> {
        self.client
            .execute_json(ApiRequest::get(endpoint("/sync-status")))
            .await
    }
}

/// Search endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Search<'a> {
    client: &'a ApiClient,
}

impl Search<'_> {
    async fn search(&self, kind: &str, query: &str, params: &Params<'_>) -> Result<Value> {
        let request = with_params(
            ApiRequest::get(endpoint(&format!("/search/{kind}"))).query([("query", query)]),
            params,
        );
        self.client.execute_json(request).await
    }

    /// Full-text search over calls and transcripts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn calls(&self, query: &str, params: &Params<'_>) -> Result<Value> {
        self.search("calls", query, params).await
    }

    /// Search agents by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn agents(&self, query: &str, params: &Params<'_>) -> Result<Value> {
        self.search("agents", query, params).await
    }
}
