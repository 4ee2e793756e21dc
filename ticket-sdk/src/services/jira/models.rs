//! Jira REST v2 data models
//!
//! Only the slices of the Jira payloads the ticket service reads or writes.

use serde::{Deserialize, Serialize};

/// Body of `POST /rest/api/2/issue`
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueRequest {
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueFields {
    pub project: ProjectRef,
    pub summary: String,
    pub description: String,
    pub issuetype: IssueTypeRef,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRef {
    #[serde(rename = "accountId")]
    pub account_id: String,
}

/// Response of `POST /rest/api/2/issue`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueResponse {
    #[serde(default)]
    pub id: String,
    pub key: String,
}

/// Response of `GET /rest/api/2/issue/createmeta`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMetaResponse {
    #[serde(default)]
    pub projects: Vec<MetaProject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaProject {
    pub key: String,
    #[serde(default)]
    pub issuetypes: Vec<MetaIssueType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaIssueType {
    pub id: String,
    pub name: String,
}

impl CreateMetaResponse {
    /// Id of the issue type named `name` within `project`; the last match wins
    pub fn issue_type_id(&self, project: &str, name: &str) -> Option<String> {
        self.projects
            .iter()
            .filter(|p| p.key == project)
            .flat_map(|p| p.issuetypes.iter())
            .filter(|t| t.name == name)
            .last()
            .map(|t| t.id.clone())
    }
}

/// Body of `POST /rest/api/2/issue/{key}/comment`
#[derive(Debug, Clone, Serialize)]
pub struct CommentRequest {
    pub body: String,
}
