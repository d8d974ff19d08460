//! Tableau Server REST client - implementation of DatasetService.
//!
//! Signs in with a personal access token before every operation and signs
//! out afterwards on success and failure alike, so no server session is left
//! dangling.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TableauConfig;
use crate::ports::{DatasetCheck, DatasetInfo, DatasetService, DatasetServiceError};

/// REST API version this client speaks.
const API_VERSION: &str = "3.22";

/// Authenticated session returned by sign-in.
struct Session {
    token: String,
    site_id: String,
}

/// Tableau Server REST API client.
pub struct TableauRestClient {
    client: Client,
    server_url: String,
    site_content_url: String,
    pat_name: String,
    pat_secret: Secret<String>,
}

impl TableauRestClient {
    /// Creates a client from the Tableau section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: &TableauConfig) -> Result<Self, DatasetServiceError> {
        let client = Client::builder().build().map_err(|e| {
            DatasetServiceError::network(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            site_content_url: config.site_id.clone(),
            pat_name: config.pat_name.clone(),
            pat_secret: Secret::new(config.pat_secret().to_string()),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.server_url, API_VERSION, path)
    }

    fn site_url(&self, session: &Session, path: &str) -> String {
        self.api_url(&format!("sites/{}/{}", session.site_id, path))
    }

    async fn sign_in(&self) -> Result<Session, DatasetServiceError> {
        let request = SignInRequest {
            credentials: SignInCredentials {
                personal_access_token_name: &self.pat_name,
                personal_access_token_secret: self.pat_secret.expose_secret(),
                site: SiteRef {
                    content_url: &self.site_content_url,
                },
            },
        };

        let response = self
            .client
            .post(self.api_url("auth/signin"))
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(DatasetServiceError::AuthenticationFailed);
        }
        let response = check_status(response).await?;

        let body: SignInResponse = response.json().await.map_err(|e| {
            DatasetServiceError::parse(format!("Invalid sign-in response: {}", e))
        })?;

        debug!(site = %body.credentials.site.id, "Signed in to Tableau Server");
        Ok(Session {
            token: body.credentials.token,
            site_id: body.credentials.site.id,
        })
    }

    /// Best-effort sign-out. Failures are logged, never propagated: the
    /// operation's own result matters more than session cleanup.
    async fn sign_out(&self, session: &Session) {
        let result = self
            .client
            .post(self.api_url("auth/signout"))
            .header("X-Tableau-Auth", &session.token)
            .send()
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Tableau sign-out failed");
        }
    }

    /// Runs one signed-in operation with guaranteed sign-out.
    async fn with_session<T, F, Fut>(&self, op: F) -> Result<T, DatasetServiceError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: std::future::Future<Output = (Session, Result<T, DatasetServiceError>)>,
    {
        let session = self.sign_in().await?;
        let (session, result) = op(session).await;
        self.sign_out(&session).await;
        result
    }

    /// Looks up a project by name, erroring when it does not exist.
    async fn find_project(
        &self,
        session: &Session,
        project: &str,
    ) -> Result<ProjectRef, DatasetServiceError> {
        let url = self.site_url(session, "projects");
        let response = self
            .client
            .get(&url)
            .query(&[("filter", format!("name:eq:{}", project))])
            .header(ACCEPT, "application/json")
            .header("X-Tableau-Auth", &session.token)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response).await?;

        let body: ProjectsResponse = response.json().await.map_err(|e| {
            DatasetServiceError::parse(format!("Invalid projects response: {}", e))
        })?;

        body.projects
            .project
            .into_iter()
            .find(|p| p.name == project)
            .ok_or_else(|| DatasetServiceError::ProjectNotFound(project.to_string()))
    }

    /// Lists every datasource on the site that belongs to the given project.
    async fn datasources_in(
        &self,
        session: &Session,
        project: &ProjectRef,
    ) -> Result<Vec<DatasetInfo>, DatasetServiceError> {
        let url = self.site_url(session, "datasources");
        let response = self
            .client
            .get(&url)
            .query(&[("pageSize", "1000")])
            .header(ACCEPT, "application/json")
            .header("X-Tableau-Auth", &session.token)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response).await?;

        let body: DatasourcesResponse = response.json().await.map_err(|e| {
            DatasetServiceError::parse(format!("Invalid datasources response: {}", e))
        })?;

        Ok(body
            .datasources
            .datasource
            .into_iter()
            .filter(|d| d.project.id == project.id)
            .map(|d| DatasetInfo {
                name: d.name,
                id: d.id,
                project_id: d.project.id,
                file_path: None,
            })
            .collect())
    }
}

#[async_trait]
impl DatasetService for TableauRestClient {
    async fn upload(
        &self,
        file: &Path,
        project: &str,
    ) -> Result<DatasetInfo, DatasetServiceError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|_| DatasetServiceError::FileNotFound(file.display().to_string()))?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("datasource.hyper")
            .to_string();
        let display_path = file.display().to_string();

        self.with_session(|session| async move {
            let result = async {
                let project_ref = self.find_project(&session, project).await?;

                let payload = serde_json::json!({
                    "datasource": {
                        "name": file.file_stem().and_then(|s| s.to_str()).unwrap_or("datasource"),
                        "project": {"id": project_ref.id}
                    }
                });

                let payload_part = Part::text(payload.to_string())
                    .mime_str("application/json")
                    .map_err(|e| DatasetServiceError::network(e.to_string()))?;
                let file_part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("application/octet-stream")
                    .map_err(|e| DatasetServiceError::network(e.to_string()))?;
                let form = Form::new()
                    .part("request_payload", payload_part)
                    .part("tableau_datasource", file_part);
                // Tableau requires multipart/mixed rather than the
                // multipart/form-data reqwest would otherwise send.
                let content_type = format!("multipart/mixed; boundary={}", form.boundary());

                let url = format!(
                    "{}?datasourceType=hyper&overwrite=true",
                    self.site_url(&session, "datasources")
                );
                info!(file = %display_path, project, "Publishing datasource to Tableau");
                let response = self
                    .client
                    .post(&url)
                    .header(ACCEPT, "application/json")
                    .header("X-Tableau-Auth", &session.token)
                    .multipart(form)
                    .header(CONTENT_TYPE, content_type)
                    .send()
                    .await
                    .map_err(map_send_error)?;
                let response = check_status(response).await?;

                let body: PublishResponse = response.json().await.map_err(|e| {
                    DatasetServiceError::parse(format!("Invalid publish response: {}", e))
                })?;

                Ok(DatasetInfo {
                    name: body.datasource.name,
                    id: body.datasource.id,
                    project_id: body.datasource.project.id,
                    file_path: Some(display_path),
                })
            }
            .await;
            (session, result)
        })
        .await
    }

    async fn check(
        &self,
        name: &str,
        project: &str,
    ) -> Result<DatasetCheck, DatasetServiceError> {
        self.with_session(|session| async move {
            let result = async {
                let project_ref = self.find_project(&session, project).await?;
                let datasets = self.datasources_in(&session, &project_ref).await?;
                Ok(match datasets.into_iter().find(|d| d.name == name) {
                    Some(found) => DatasetCheck::found(&found.name, &found.id, &found.project_id),
                    None => DatasetCheck::missing(name, project),
                })
            }
            .await;
            (session, result)
        })
        .await
    }

    async fn list(&self, project: &str) -> Result<Vec<DatasetInfo>, DatasetServiceError> {
        self.with_session(|session| async move {
            let result = async {
                let project_ref = self.find_project(&session, project).await?;
                self.datasources_in(&session, &project_ref).await
            }
            .await;
            (session, result)
        })
        .await
    }
}

fn map_send_error(e: reqwest::Error) -> DatasetServiceError {
    if e.is_connect() || e.is_timeout() {
        DatasetServiceError::network(format!("Cannot reach Tableau Server: {}", e))
    } else {
        DatasetServiceError::network(e.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, DatasetServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(DatasetServiceError::AuthenticationFailed);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DatasetServiceError::Api {
        status: status.as_u16(),
        message: body,
    })
}

// ----- Tableau REST API Types -----

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    credentials: SignInCredentials<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInCredentials<'a> {
    personal_access_token_name: &'a str,
    personal_access_token_secret: &'a str,
    site: SiteRef<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteRef<'a> {
    content_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    credentials: SignInResponseCredentials,
}

#[derive(Debug, Deserialize)]
struct SignInResponseCredentials {
    token: String,
    site: SiteId,
}

#[derive(Debug, Deserialize)]
struct SiteId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: ProjectList,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectList {
    #[serde(default)]
    project: Vec<ProjectRef>,
}

#[derive(Debug, Deserialize)]
struct ProjectRef {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DatasourcesResponse {
    #[serde(default)]
    datasources: DatasourceList,
}

#[derive(Debug, Default, Deserialize)]
struct DatasourceList {
    #[serde(default)]
    datasource: Vec<DatasourceRef>,
}

#[derive(Debug, Deserialize)]
struct DatasourceRef {
    id: String,
    name: String,
    project: DatasourceProject,
}

#[derive(Debug, Deserialize)]
struct DatasourceProject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    datasource: DatasourceRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_request_uses_tableau_field_names() {
        let request = SignInRequest {
            credentials: SignInCredentials {
                personal_access_token_name: "ci-token",
                personal_access_token_secret: "s3cret",
                site: SiteRef { content_url: "analytics" },
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        let credentials = &value["credentials"];
        assert_eq!(credentials["personalAccessTokenName"], "ci-token");
        assert_eq!(credentials["personalAccessTokenSecret"], "s3cret");
        assert_eq!(credentials["site"]["contentUrl"], "analytics");
    }

    #[test]
    fn sign_in_response_parses() {
        let raw = serde_json::json!({
            "credentials": {
                "token": "abc123",
                "site": {"id": "site-1", "contentUrl": "analytics"},
                "user": {"id": "u-1"}
            }
        });

        let parsed: SignInResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.credentials.token, "abc123");
        assert_eq!(parsed.credentials.site.id, "site-1");
    }

    #[test]
    fn empty_projects_response_parses() {
        let raw = serde_json::json!({"projects": {}});
        let parsed: ProjectsResponse = serde_json::from_value(raw).unwrap();
        assert!(parsed.projects.project.is_empty());
    }

    #[test]
    fn datasources_response_parses() {
        let raw = serde_json::json!({
            "datasources": {
                "datasource": [
                    {"id": "d-1", "name": "sales", "project": {"id": "p-1", "name": "Sales"}},
                    {"id": "d-2", "name": "costs", "project": {"id": "p-2", "name": "Finance"}}
                ]
            }
        });

        let parsed: DatasourcesResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.datasources.datasource.len(), 2);
        assert_eq!(parsed.datasources.datasource[0].project.id, "p-1");
    }

    #[test]
    fn publish_response_parses() {
        let raw = serde_json::json!({
            "datasource": {
                "id": "d-9",
                "name": "sales_2024",
                "project": {"id": "p-1"}
            }
        });

        let parsed: PublishResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.datasource.id, "d-9");
        assert_eq!(parsed.datasource.name, "sales_2024");
    }
}
