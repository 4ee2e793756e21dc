//! Jira client implementation
//!
//! This module provides a client for the Jira REST v2 API covering what the
//! ticket service needs: issue-type metadata, issue creation and comments.

mod models;
pub use models::*;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::config::{JiraConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::{CreatedIssue, NewIssue, ServiceClient, TicketSystem};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, parse_error_response, UserAgent};

const API_PREFIX: &str = "rest/api/2";

/// Jira client
pub struct JiraClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: JiraConfig,

    /// `scheme://host[:port]` of the Jira site, used for browse links
    site_origin: String,
}

impl JiraClient {
    /// Create a client from the process environment (`JIRA_*` variables)
    pub fn from_env() -> Result<Self> {
        let config = JiraConfig::from_provider(&**DEFAULT_PROVIDER)?;
        Self::new_with_config(config)
    }

    /// Create a new Jira client with custom configuration
    pub fn new_with_config(config: JiraConfig) -> Result<Self> {
        config.validate()?;

        let site = Url::parse(&config.base_url)
            .map_err(|e| ServiceError::configuration(format!("Invalid Jira URL: {}", e)))?;
        let site_origin = site.origin().ascii_serialization();

        let http_client = build_http_client(
            Some(UserAgent::for_client("Jira-Client")),
            Some(Duration::from_secs(config.timeout_seconds)),
        )?;

        Ok(Self {
            http_client,
            config,
            site_origin,
        })
    }

    /// Create a new builder for the Jira client
    pub fn builder() -> JiraClientBuilder {
        JiraClientBuilder::default()
    }

    /// Project tickets are filed under
    pub fn project_key(&self) -> &str {
        &self.config.project_key
    }

    /// Browser link for an issue key
    pub fn browse_link(&self, key: &str) -> String {
        format!("{}/browse/{}", self.site_origin, key)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.config.base_url.trim_end_matches('/'), API_PREFIX, endpoint)
    }

    async fn send<T>(&self, method: Method, endpoint: &str, body: Option<&T>) -> Result<reqwest::Response>
    where
        T: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint);
        debug!("Sending request to Jira: {} {}", method, url);

        let mut builder = self
            .http_client
            .request(method, &url)
            .basic_auth(&self.config.username, Some(&self.config.api_token))
            .header("Accept", "application/json");

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(parse_error_response("jira", endpoint, response).await)
        }
    }

    async fn send_json<T, R>(&self, method: Method, endpoint: &str, body: Option<&T>) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(method, endpoint, body).await?;

        response
            .json::<R>()
            .await
            .map_err(|e| ServiceError::parsing(format!("Failed to parse Jira response: {}", e)))
    }
}

#[async_trait]
impl ServiceClient for JiraClient {
    fn name(&self) -> &str {
        "jira"
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn health_check(&self) -> Result<bool> {
        match self.send::<()>(Method::GET, "myself", None).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Jira health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl TicketSystem for JiraClient {
    async fn lookup_issue_type_id(&self, project: &str, name: &str) -> Result<Option<String>> {
        let endpoint = format!("issue/createmeta?projectKeys={}&expand=projects.issuetypes", project);
        let meta: CreateMetaResponse = self.send_json::<(), _>(Method::GET, &endpoint, None).await?;

        Ok(meta.issue_type_id(project, name))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let request = CreateIssueRequest {
            fields: IssueFields {
                project: ProjectRef {
                    key: issue.project_key.clone(),
                },
                summary: issue.summary.clone(),
                description: issue.description.clone(),
                issuetype: IssueTypeRef {
                    id: issue.issue_type_id.clone(),
                },
                assignee: (!issue.assignee.is_empty()).then(|| UserRef {
                    account_id: issue.assignee.clone(),
                }),
            },
        };

        let created: CreateIssueResponse = self.send_json(Method::POST, "issue", Some(&request)).await?;
        debug!("Jira issue created: id={} key={}", created.id, created.key);

        Ok(CreatedIssue {
            link: self.browse_link(&created.key),
            key: created.key,
        })
    }

    async fn add_comment(&self, ticket_id: &str, body: &str) -> Result<()> {
        let endpoint = format!("issue/{}/comment", ticket_id);
        let request = CommentRequest { body: body.to_string() };

        self.send(Method::POST, &endpoint, Some(&request)).await?;
        Ok(())
    }
}

/// Builder for Jira client
#[derive(Default)]
pub struct JiraClientBuilder {
    base_url: Option<String>,
    username: Option<String>,
    api_token: Option<String>,
    project_key: Option<String>,
    timeout_seconds: Option<u64>,
}

impl JiraClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Jira site URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the basic-auth username
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the API token
    pub fn api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    /// Set the project key
    pub fn project_key(mut self, project_key: impl Into<String>) -> Self {
        self.project_key = Some(project_key.into());
        self
    }

    /// Set the timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Build the Jira client
    pub fn build(self) -> Result<JiraClient> {
        let mut config = JiraConfig::default();

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(username) = self.username {
            config.username = username;
        }

        if let Some(api_token) = self.api_token {
            config.api_token = api_token;
        }

        if let Some(project_key) = self.project_key {
            config.project_key = project_key;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        JiraClient::new_with_config(config)
    }
}
