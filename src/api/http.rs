use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::{ Client as HttpClient, RequestBuilder, StatusCode, header::AUTHORIZATION };
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use url::Url;

use super::{ ApiError, ChatApi };
use crate::config::ClientConfig;
use crate::models::api::{
    ChatRequest,
    ConversationsResponse,
    Credentials,
    ErrorBody,
    MessageResponse,
    NewChatRequest,
    ReplyResponse,
    SaveChatRequest,
    TokenResponse,
};
use crate::storage::{ LocalStore, AUTH_TOKEN_KEY };

pub struct HttpChatApi {
    http: HttpClient,
    base_url: Url,
    store: Arc<dyn LocalStore>,
}

impl HttpChatApi {
    pub fn from_config(config: &ClientConfig, store: Arc<dyn LocalStore>) -> Result<Self, ApiError> {
        let http = HttpClient::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.server_url.clone(),
            store,
        })
    }

    fn endpoint(&self, route: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(route.trim_start_matches('/'))?)
    }

    /// The token is read on every request so a login or logout takes effect
    /// without rebuilding the client.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.store.get(AUTH_TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => {
                req.header(AUTHORIZATION, format!("Bearer {}", token))
            }
            Ok(_) => req,
            Err(e) => {
                warn!("Could not read auth token from local storage: {}", e);
                req
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        self.send_json_with(req, ErrorBody::into_text).await
    }

    /// `error_text` picks the human-readable field out of a failure body.
    async fn send_json_with<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        error_text: fn(ErrorBody) -> Option<String>
    ) -> Result<T, ApiError> {
        let resp = self.authorize(req).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json
                ::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(error_text);
            debug!("Server error {}: {}", status, body);
            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized(message));
            }
            return Err(ApiError::Server { status: status.as_u16(), message });
        }

        let body = resp.text().await?;
        serde_json
            ::from_str::<T>(&body)
            .map_err(|e| ApiError::MalformedResponse(format!("{} (body: {})", e, body)))
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field.ok_or_else(|| ApiError::MalformedResponse(format!("response is missing '{}'", name)))
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn register(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.endpoint("/register")?;
        let resp: MessageResponse = self.send_json(self.http.post(url).json(credentials)).await?;
        Ok(resp.message.unwrap_or_default())
    }

    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.endpoint("/login")?;
        let resp: TokenResponse = self.send_json(self.http.post(url).json(credentials)).await?;
        let token = required(resp.token, "token")?;
        if token.is_empty() {
            return Err(ApiError::MalformedResponse("empty token".into()));
        }
        Ok(token)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let url = self.endpoint("/chat")?;
        let resp: ReplyResponse = self.send_json(self.http.post(url).json(request)).await?;
        required(resp.reply, "reply")
    }

    async fn save_chat(&self, request: &SaveChatRequest) -> Result<String, ApiError> {
        let url = self.endpoint("/save-chat")?;
        let resp: MessageResponse = self.send_json_with(
            self.http.post(url).json(request),
            ErrorBody::into_message_text
        ).await?;
        Ok(resp.message.unwrap_or_default())
    }

    async fn get_conversations(&self, user_id: Option<&str>) -> Result<Vec<JsonValue>, ApiError> {
        let mut url = self.endpoint("/get-conversations")?;
        if let Some(id) = user_id {
            url.query_pairs_mut().append_pair("user_id", id);
        }
        let resp: ConversationsResponse = self.send_json(self.http.get(url)).await?;
        Ok(resp.conversations)
    }

    async fn new_chat(&self, user_id: &str) -> Result<String, ApiError> {
        let url = self.endpoint("/new-chat")?;
        let body = NewChatRequest { user_id: user_id.to_string() };
        let resp: MessageResponse = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(resp.message.unwrap_or_default())
    }
}
