//! HTTP client for the platform script registry

use crate::error::{ApiMessage, RegistryError, Result};
use crate::metadata::{binding_file_parts, upload_metadata};
use crate::registry::{ScriptRegistry, ScriptSummary, UploadResponse};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use skiff_types::{AccountId, ModuleSource, ScriptTarget, WorkerUpload};
use tracing::{debug, instrument};

/// Default platform API endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.cloudflare.com/client/v4";

/// Envelope wrapping every API response
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubdomainResult {
    subdomain: String,
}

/// Registry client speaking the platform REST API
pub struct HttpScriptRegistry {
    client: Client,
    base_url: String,
    api_token: String,
}

impl HttpScriptRegistry {
    /// Create a new registry client
    pub fn new(endpoint: &str, api_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- Internal HTTP helpers ---

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = request.bearer_auth(&self.api_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) if envelope.success => Ok(envelope.result),
            Ok(envelope) => Err(RegistryError::Api {
                errors: envelope.errors,
            }),
            Err(e) if status.is_success() => Err(RegistryError::Encode(format!(
                "unreadable response body: {}",
                e
            ))),
            Err(_) => Err(RegistryError::Status {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    async fn fetch_required<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        self.fetch(request)
            .await?
            .ok_or_else(|| RegistryError::Encode(format!("{} response carried no result", what)))
    }

    async fn build_form(&self, upload: &WorkerUpload) -> Result<Form> {
        let metadata = serde_json::to_string(&upload_metadata(upload))
            .map_err(|e| RegistryError::Encode(e.to_string()))?;

        let mut form = Form::new()
            .text("metadata", metadata)
            .part(upload.main.name.clone(), module_part(&upload.main)?);

        for module in &upload.modules {
            form = form.part(module.name.clone(), module_part(module)?);
        }

        for file in binding_file_parts(upload) {
            let content = tokio::fs::read(&file.path)
                .await
                .map_err(|source| RegistryError::BindingSource {
                    path: file.path.clone(),
                    source,
                })?;
            let part = Part::bytes(content)
                .file_name(file.path.clone())
                .mime_str(file.module_type.content_type())?;
            form = form.part(file.name, part);
        }

        Ok(form)
    }
}

fn module_part(module: &ModuleSource) -> Result<Part> {
    Ok(Part::bytes(module.content.clone())
        .file_name(module.name.clone())
        .mime_str(module.module_type.content_type())?)
}

#[async_trait]
impl ScriptRegistry for HttpScriptRegistry {
    #[instrument(skip(self), fields(account = %account))]
    async fn list_scripts(&self, account: &AccountId) -> Result<Vec<ScriptSummary>> {
        let url = self.url(&format!("/accounts/{}/workers/scripts", account));
        self.fetch_required(self.client.get(&url), "script listing")
            .await
    }

    #[instrument(skip(self, upload), fields(path = %target.path()))]
    async fn put_script(
        &self,
        target: &ScriptTarget,
        upload: &WorkerUpload,
    ) -> Result<UploadResponse> {
        let form = self.build_form(upload).await?;
        let request = self
            .client
            .put(self.url(&target.path()))
            .query(&[("available_on_subdomain", "true")])
            .multipart(form);

        let response: UploadResponse = self.fetch(request).await?.unwrap_or_default();
        debug!(
            available_on_subdomain = response.available_on_subdomain,
            "Script uploaded"
        );
        Ok(response)
    }

    #[instrument(skip(self), fields(account = %account))]
    async fn get_subdomain(&self, account: &AccountId) -> Result<String> {
        let url = self.url(&format!("/accounts/{}/workers/subdomain", account));
        let result: SubdomainResult = self
            .fetch_required(self.client.get(&url), "subdomain")
            .await?;
        Ok(result.subdomain)
    }

    #[instrument(skip(self), fields(path = %target.path()))]
    async fn set_subdomain_enabled(&self, target: &ScriptTarget, enabled: bool) -> Result<()> {
        let url = self.url(&format!("{}/subdomain", target.path()));
        let request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "enabled": enabled }));
        self.fetch::<serde_json::Value>(request).await?;
        Ok(())
    }

    #[instrument(skip(self, patterns), fields(path = %target.path(), count = patterns.len()))]
    async fn put_routes(&self, target: &ScriptTarget, patterns: &[String]) -> Result<()> {
        let url = self.url(&format!("{}/routes", target.path()));
        let body: Vec<serde_json::Value> = patterns
            .iter()
            .map(|pattern| serde_json::json!({ "pattern": pattern }))
            .collect();
        self.fetch::<serde_json::Value>(self.client.put(&url).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, crons), fields(path = %target.path(), count = crons.len()))]
    async fn put_schedules(&self, target: &ScriptTarget, crons: &[String]) -> Result<()> {
        let url = self.url(&format!("{}/schedules", target.path()));
        let body: Vec<serde_json::Value> = crons
            .iter()
            .map(|cron| serde_json::json!({ "cron": cron }))
            .collect();
        self.fetch::<serde_json::Value>(self.client.put(&url).json(&body))
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skiff_types::{ArtifactFormat, BindingSet, ModuleType, ScriptName};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target() -> ScriptTarget {
        ScriptTarget::resolve(AccountId::new("acct"), ScriptName::new("api"), None, false)
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": result,
        }))
    }

    #[test]
    fn test_endpoint_normalization() {
        let registry = HttpScriptRegistry::new("http://localhost:8787/", "token").unwrap();
        assert_eq!(registry.base_url(), "http://localhost:8787");
    }

    #[tokio::test]
    async fn test_list_scripts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/acct/workers/scripts"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ok(json!([
                { "id": "api", "migration_tag": "v2" },
                { "id": "other" }
            ])))
            .mount(&server)
            .await;

        let registry = HttpScriptRegistry::new(&server.uri(), "token").unwrap();
        let scripts = registry.list_scripts(&AccountId::new("acct")).await.unwrap();

        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].migration_tag.as_deref(), Some("v2"));
        assert_eq!(scripts[1].migration_tag, None);
    }

    #[tokio::test]
    async fn test_api_errors_surface() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/acct/workers/subdomain"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "errors": [{ "code": 10007, "message": "no subdomain" }],
                "messages": [],
                "result": null,
            })))
            .mount(&server)
            .await;

        let registry = HttpScriptRegistry::new(&server.uri(), "token").unwrap();
        let err = registry
            .get_subdomain(&AccountId::new("acct"))
            .await
            .unwrap_err();

        match err {
            RegistryError::Api { errors } => assert_eq!(errors[0].code, 10007),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_envelope_failure_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/accounts/acct/workers/scripts/api/schedules"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let registry = HttpScriptRegistry::new(&server.uri(), "token").unwrap();
        let err = registry
            .put_schedules(&target(), &["*/5 * * * *".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_routes_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/accounts/acct/workers/scripts/api/routes"))
            .and(body_json(json!([
                { "pattern": "example.com/*" },
                { "pattern": "api.example.com/v1/*" }
            ])))
            .respond_with(ok(json!(null)))
            .expect(1)
            .mount(&server)
            .await;

        let registry = HttpScriptRegistry::new(&server.uri(), "token").unwrap();
        registry
            .put_routes(
                &target(),
                &["example.com/*".to_string(), "api.example.com/v1/*".to_string()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_subdomain_toggle_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/acct/workers/scripts/api/subdomain"))
            .and(body_json(json!({ "enabled": false })))
            .respond_with(ok(json!({ "enabled": false })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = HttpScriptRegistry::new(&server.uri(), "token").unwrap();
        registry.set_subdomain_enabled(&target(), false).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_script_requests_subdomain_state() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/accounts/acct/workers/scripts/api"))
            .and(query_param("available_on_subdomain", "true"))
            .respond_with(ok(json!({ "id": "api", "available_on_subdomain": true })))
            .expect(1)
            .mount(&server)
            .await;

        let upload = WorkerUpload {
            name: ScriptName::new("api"),
            format: ArtifactFormat::Modules,
            main: ModuleSource::new("index.js", "export default {}", ModuleType::Esm),
            modules: vec![],
            bindings: BindingSet::default(),
            compatibility_date: "2022-03-01".into(),
            compatibility_flags: vec![],
            usage_model: None,
        };

        let registry = HttpScriptRegistry::new(&server.uri(), "token").unwrap();
        let response = registry.put_script(&target(), &upload).await.unwrap();
        assert!(response.available_on_subdomain);
    }

    #[tokio::test]
    async fn test_missing_binding_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.wasm");

        let mut bindings = BindingSet::default();
        bindings
            .wasm_modules
            .insert("MODULE".into(), missing.display().to_string());

        let upload = WorkerUpload {
            name: ScriptName::new("api"),
            format: ArtifactFormat::ServiceWorker,
            main: ModuleSource::new("index.js", "", ModuleType::CommonJs),
            modules: vec![],
            bindings,
            compatibility_date: "2022-03-01".into(),
            compatibility_flags: vec![],
            usage_model: None,
        };

        let registry = HttpScriptRegistry::new("http://127.0.0.1:9", "token").unwrap();
        let err = registry.put_script(&target(), &upload).await.unwrap_err();
        assert!(matches!(err, RegistryError::BindingSource { .. }));
    }
}
