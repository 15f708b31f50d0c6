//! HTTP persistence gateway over the household REST API.
//!
//! # Responsibility
//! - Map gateway operations onto REST routes with camelCase JSON bodies.
//! - Convert transport, status and decode failures into `GatewayError`.
//!
//! # Routes
//! - `POST /households` search, `POST /households/new` create
//! - `GET|PUT /households/{id}`
//! - `GET|POST /households/{id}/members`
//! - `DELETE /households/{id}/members/{memberId}`

use crate::config::GatewayConfig;
use crate::gateway::{GatewayError, GatewayResult, PersistenceGateway};
use crate::model::household::{
    FetchHouseholdsRequest, FetchHouseholdsResponse, Household, HouseholdFields,
};
use crate::model::member::{DeleteMemberResponse, MemberRecord};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("household_core/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 200;

/// `reqwest`-backed gateway.
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Builds a client from resolved configuration.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> GatewayResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        debug!(
            "event=gateway_response module=gateway operation={} status={}",
            operation,
            status.as_u16()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(match status.as_u16() {
                404 => GatewayError::NotFound(body),
                422 => GatewayError::Validation(body),
                code => GatewayError::Status { status: code, body },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn fetch_households(
        &self,
        request: &FetchHouseholdsRequest,
    ) -> GatewayResult<FetchHouseholdsResponse> {
        request.check_paging().map_err(GatewayError::Validation)?;
        let builder = self.request(Method::POST, "/households").json(request);
        self.send("fetch_households", builder).await
    }

    async fn create_household(&self, fields: &HouseholdFields) -> GatewayResult<Household> {
        let builder = self.request(Method::POST, "/households/new").json(fields);
        self.send("create_household", builder).await
    }

    async fn get_household(&self, household_uid: &str) -> GatewayResult<Household> {
        let builder = self.request(Method::GET, &household_path(household_uid));
        self.send("get_household", builder).await
    }

    async fn update_household(
        &self,
        household_uid: &str,
        fields: &HouseholdFields,
    ) -> GatewayResult<Household> {
        let builder = self
            .request(Method::PUT, &household_path(household_uid))
            .json(fields);
        self.send("update_household", builder).await
    }

    async fn get_members(&self, household_uid: &str) -> GatewayResult<Vec<MemberRecord>> {
        let builder = self.request(Method::GET, &members_path(household_uid));
        self.send("get_members", builder).await
    }

    async fn upsert_members(
        &self,
        household_uid: &str,
        members: &[MemberRecord],
    ) -> GatewayResult<Vec<MemberRecord>> {
        let builder = self
            .request(Method::POST, &members_path(household_uid))
            .json(members);
        self.send("upsert_members", builder).await
    }

    async fn delete_member(
        &self,
        household_uid: &str,
        member_uid: &str,
    ) -> GatewayResult<DeleteMemberResponse> {
        let path = format!("{}/{}", members_path(household_uid), member_uid);
        let builder = self.request(Method::DELETE, &path);
        self.send("delete_member", builder).await
    }
}

fn household_path(household_uid: &str) -> String {
    format!("/households/{household_uid}")
}

fn members_path(household_uid: &str) -> String {
    format!("/households/{household_uid}/members")
}
