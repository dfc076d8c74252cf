use async_trait::async_trait;
use parley_core::config::ConversationConfig;
use parley_core::{MessageRequest, ServiceReply, UpstreamError};
use reqwest::{header::CONTENT_TYPE, Client, Url};
use secrecy::{ExposeSecret, SecretString};

/// One request/response exchange with the conversation service.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn message(&self, request: &MessageRequest) -> Result<ServiceReply, UpstreamError>;
}

/// Workspace message API over HTTP:
/// `POST {base_url}/v1/workspaces/{workspace_id}/message?version={version_date}`.
pub struct HttpConversationService {
    client: Client,
    base_url: String,
    version_date: String,
    credentials: Option<(String, SecretString)>,
}

impl HttpConversationService {
    pub fn new(config: &ConversationConfig) -> Result<Self, reqwest::Error> {
        let client =
            Client::builder().user_agent(concat!("parley/", env!("CARGO_PKG_VERSION"))).build()?;
        let credentials = match (&config.username, &config.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            version_date: config.version_date.clone(),
            credentials,
        })
    }

    /// The workspace id is percent-encoded as a single path segment.
    pub fn message_url(&self, workspace_id: &str) -> Result<Url, UpstreamError> {
        let invalid = || {
            UpstreamError::transport(format!(
                "conversation base url `{}` cannot carry a message path",
                self.base_url
            ))
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(["v1", "workspaces", workspace_id, "message"]);
        url.query_pairs_mut().append_pair("version", &self.version_date);
        Ok(url)
    }
}

#[async_trait]
impl ConversationService for HttpConversationService {
    async fn message(&self, request: &MessageRequest) -> Result<ServiceReply, UpstreamError> {
        let url = self.message_url(&request.workspace_id)?;
        let mut builder = self.client.post(url).json(request);
        if let Some((username, password)) = &self.credentials {
            builder = builder.basic_auth(username, Some(password.expose_secret()));
        }

        let response = builder.send().await.map_err(|error| {
            UpstreamError::transport(format!("conversation service request failed: {error}"))
        })?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|error| {
            UpstreamError::transport(format!("conversation service reply was cut short: {error}"))
        })?;

        if !status.is_success() {
            return Err(UpstreamError::from_response(
                status.as_u16(),
                content_type.as_deref(),
                &body,
            ));
        }

        serde_json::from_slice(&body).map_err(|error| {
            UpstreamError::transport(format!("failed to decode conversation reply: {error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use parley_core::config::AppConfig;
    use parley_core::{ConversationContext, MessageInput, MessageRequest};
    use serde_json::{json, Value};

    use super::{ConversationService, HttpConversationService};

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
        let address = listener.local_addr().expect("upstream address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}")
    }

    async fn echo_message(
        Path(workspace): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let authorized = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("Basic "))
            .unwrap_or(false);

        Json(json!({
            "intents": [{ "intent": "greeting", "confidence": 0.92 }],
            "output": { "text": [format!("workspace {workspace}")] },
            "context": { "conversation_id": "c-1", "echo": body["context"].clone() },
            "version": query.get("version").cloned(),
            "authorized": authorized,
            "received": body,
        }))
    }

    fn service_for(base_url: String, with_credentials: bool) -> HttpConversationService {
        let mut config = AppConfig::default().conversation;
        config.base_url = format!("{base_url}/");
        if with_credentials {
            config.username = Some("relay".to_string());
            config.password = Some("secret".to_string().into());
        }
        HttpConversationService::new(&config).expect("client should build")
    }

    #[test]
    fn message_url_includes_workspace_and_version() {
        let service = service_for("https://conversation.example/api".to_string(), false);

        assert_eq!(
            service.message_url("ws-1").expect("url").as_str(),
            "https://conversation.example/api/v1/workspaces/ws-1/message?version=2017-04-21"
        );
    }

    #[test]
    fn workspace_id_cannot_change_the_request_target() {
        let service = service_for("https://conversation.example/api".to_string(), false);

        let url = service.message_url("team/a?b#c").expect("url");

        assert_eq!(url.path(), "/api/v1/workspaces/team%2Fa%3Fb%23c/message");
        assert_eq!(url.query(), Some("version=2017-04-21"));
        assert_eq!(url.fragment(), None);
    }

    #[tokio::test]
    async fn encoded_workspace_reaches_the_workspace_route() {
        let base_url = spawn_upstream(
            Router::new().route("/v1/workspaces/{workspace}/message", post(echo_message)),
        )
        .await;
        let service = service_for(base_url, false);

        let reply = service
            .message(&MessageRequest::new("team/a?b", MessageInput::text("hello"), None))
            .await
            .expect("upstream should answer");

        assert_eq!(reply.first_text(), Some("workspace team/a?b"));
    }

    #[tokio::test]
    async fn successful_reply_is_decoded_with_payload_fields() {
        let base_url = spawn_upstream(
            Router::new().route("/v1/workspaces/{workspace}/message", post(echo_message)),
        )
        .await;
        let service = service_for(base_url, true);
        let context: ConversationContext =
            serde_json::from_value(json!({ "conversation_id": "c-0" })).expect("context");

        let reply = service
            .message(&MessageRequest::new("ws-7", MessageInput::text("hello"), Some(context)))
            .await
            .expect("upstream should answer");

        assert_eq!(reply.first_text(), Some("workspace ws-7"));
        assert_eq!(reply.top_intent().map(|intent| intent.confidence), Some(0.92));
        assert_eq!(reply.other["version"], json!("2017-04-21"));
        assert_eq!(reply.other["authorized"], json!(true));
        assert_eq!(
            reply.other["received"],
            json!({
                "input": { "text": "hello" },
                "context": { "conversation_id": "c-0" },
                "alternate_intents": true
            })
        );
        assert_eq!(reply.context.as_ref().and_then(|c| c.conversation_id()), Some("c-1"));
    }

    #[tokio::test]
    async fn requests_without_credentials_skip_basic_auth() {
        let base_url = spawn_upstream(
            Router::new().route("/v1/workspaces/{workspace}/message", post(echo_message)),
        )
        .await;
        let service = service_for(base_url, false);

        let reply = service
            .message(&MessageRequest::new("ws-7", MessageInput::text("hello"), None))
            .await
            .expect("upstream should answer");

        assert_eq!(reply.other["authorized"], json!(false));
        assert_eq!(reply.other["received"].get("context"), None);
    }

    #[tokio::test]
    async fn error_status_and_body_are_preserved() {
        let base_url = spawn_upstream(Router::new().route(
            "/v1/workspaces/{workspace}/message",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    [("content-type", "application/json")],
                    r#"{"error":"Service Unavailable","code":503}"#,
                )
            }),
        ))
        .await;
        let service = service_for(base_url, false);

        let error = service
            .message(&MessageRequest::new("ws-7", MessageInput::text("hello"), None))
            .await
            .expect_err("upstream failure should surface");

        assert_eq!(error.status, 503);
        assert_eq!(error.message, "Service Unavailable");
        let body = error.body.expect("provider body");
        assert_eq!(body.content_type.as_deref(), Some("application/json"));
        assert_eq!(body.bytes, br#"{"error":"Service Unavailable","code":503}"#);
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_default_status() {
        let service = service_for("http://127.0.0.1:1".to_string(), false);

        let error = service
            .message(&MessageRequest::new("ws-7", MessageInput::text("hello"), None))
            .await
            .expect_err("connection should fail");

        assert_eq!(error.status, 500);
        assert!(error.message.starts_with("conversation service request failed"));
        assert_eq!(error.body, None);
    }
}
