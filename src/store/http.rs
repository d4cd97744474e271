use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::session::result::{SessionFilter, SessionRecord};
use crate::store::gateway::{AuthGrant, Gateway, GatewayError};
use crate::store::schema::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway talking JSON to a sync server (`/api/state`, `/api/sessions`).
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send()?;
        if !response.status().is_success() {
            return Err(GatewayError::Status {
                status: response.status().as_u16(),
                path: path.to_string(),
            });
        }
        Ok(response)
    }

    fn sessions_query(filter: &SessionFilter) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(list_id) = &filter.list_id {
            query.push(("listId", list_id.clone()));
        }
        if let Some(user_id) = &filter.user_id {
            query.push(("userId", user_id.clone()));
        }
        query
    }
}

impl Gateway for HttpGateway {
    fn load_state(&self) -> Result<Option<AppState>, GatewayError> {
        let path = "/api/state";
        let response = self.send(path, self.client.get(self.url(path)))?;
        let body = response.text()?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn save_state(&self, state: &AppState) -> Result<(), GatewayError> {
        let path = "/api/state";
        let body = serde_json::to_string(state)?;
        self.send(
            path,
            self.client
                .put(self.url(path))
                .header("Content-Type", "application/json")
                .body(body),
        )?;
        Ok(())
    }

    fn save_session(&self, record: &SessionRecord) -> Result<(), GatewayError> {
        let path = "/api/sessions";
        let body = serde_json::to_string(record)?;
        self.send(
            path,
            self.client
                .post(self.url(path))
                .header("Content-Type", "application/json")
                .body(body),
        )?;
        Ok(())
    }

    fn query_sessions(&self, filter: &SessionFilter) -> Result<Vec<SessionRecord>, GatewayError> {
        let path = "/api/sessions";
        let request = self
            .client
            .get(self.url(path))
            .query(&Self::sessions_query(filter));
        let body = self.send(path, request)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn clear_sessions(&self, user_id: Option<&str>) -> Result<(), GatewayError> {
        let path = "/api/sessions";
        let mut request = self.client.delete(self.url(path));
        if let Some(user_id) = user_id {
            request = request.query(&[("userId", user_id)]);
        }
        self.send(path, request)?;
        Ok(())
    }

    fn authenticate(&self, pin: &str) -> Result<AuthGrant, GatewayError> {
        let path = "/api/auth";
        let body = serde_json::json!({ "pin": pin }).to_string();
        let response = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(GatewayError::AuthDenied);
        }
        if !response.status().is_success() {
            return Err(GatewayError::Status {
                status: response.status().as_u16(),
                path: path.to_string(),
            });
        }
        let grant: AuthGrant = serde_json::from_str(&response.text()?)?;
        if grant.is_empty() {
            return Err(GatewayError::AuthDenied);
        }
        Ok(grant)
    }
}
