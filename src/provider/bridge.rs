//! HTTP bridge client
//!
//! Talks JSON to a local gateway process that holds the actual provider
//! connection and its session file.

use super::{
    Credentials, GroupEntity, GroupRef, LoginToken, Member, MessagingClient, ProviderError,
    ProviderErrorKind,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

const SESSION_HEADER: &str = "x-bridge-session";

/// Messaging client backed by the HTTP bridge
pub struct BridgeClient {
    client: Client,
    base_url: Url,
    session_name: String,
    /// Bridge-issued session id, set by `connect`
    session_id: Mutex<Option<String>>,
}

impl BridgeClient {
    pub fn new(
        base_url: &str,
        session_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::network(format!("Invalid bridge URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::network(format!(
                "Invalid bridge URL {base_url}: not a base URL"
            )));
        }

        Ok(Self {
            client,
            base_url,
            session_name: session_name.into(),
            session_id: Mutex::new(None),
        })
    }

    /// Endpoint URL; each segment is percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session_id() {
            Some(id) => request.header(SESSION_HEADER, id),
            None => request,
        }
    }

    /// Send and return the raw body of a 2xx response
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, ProviderError> {
        let response = self.with_session(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                ProviderError::network(format!("Connection failed: {e}"))
            } else {
                ProviderError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })
    }

    /// Send a call whose success carries no payload. Any 2xx counts,
    /// including `204 No Content` and an empty `200`.
    async fn send_ack(&self, request: RequestBuilder) -> Result<(), ProviderError> {
        self.send_raw(request).await.map(drop)
    }
}

/// Map a bridge error response onto the provider taxonomy
fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let parsed: Option<BridgeErrorBody> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(BridgeErrorBody { error }) => (error.code, error.message),
        None => (String::new(), body.to_string()),
    };

    if let Some(seconds) = code
        .strip_prefix("FLOOD_WAIT_")
        .and_then(|s| s.parse::<u64>().ok())
    {
        return ProviderError::rate_limit(format!("Flood wait of {seconds}s: {message}"))
            .with_retry_after(Duration::from_secs(seconds));
    }

    let kind = match code.as_str() {
        "PEER_FLOOD" => ProviderErrorKind::RateLimit,
        "USER_PRIVACY_RESTRICTED" => ProviderErrorKind::PrivacyRestricted,
        "API_ID_INVALID" | "SESSION_PASSWORD_NEEDED" | "PHONE_NUMBER_INVALID" => {
            ProviderErrorKind::Auth
        }
        c if c.starts_with("PHONE_CODE_") || c.starts_with("AUTH_KEY_") => ProviderErrorKind::Auth,
        c if c.starts_with("USERNAME_") || c.starts_with("CHANNEL_") || c.starts_with("CHAT_") => {
            ProviderErrorKind::Lookup
        }
        _ => match status.as_u16() {
            429 => ProviderErrorKind::RateLimit,
            401 => ProviderErrorKind::Auth,
            403 | 404 => ProviderErrorKind::Lookup,
            _ => ProviderErrorKind::Unknown,
        },
    };

    let detail = if code.is_empty() {
        format!("HTTP {status}: {message}")
    } else {
        format!("{code}: {message}")
    };
    ProviderError::new(kind, detail)
}

#[async_trait]
impl MessagingClient for BridgeClient {
    async fn connect(&self, credentials: &Credentials) -> Result<(), ProviderError> {
        let request = ConnectRequest {
            session: &self.session_name,
            api_id: credentials.api_id,
            api_hash: &credentials.api_hash,
        };
        let response: ConnectResponse = self
            .send(self.client.post(self.url(&["connect"])).json(&request))
            .await?;

        if let Ok(mut guard) = self.session_id.lock() {
            *guard = Some(response.session_id);
        }
        Ok(())
    }

    async fn is_authorized(&self) -> Result<bool, ProviderError> {
        let response: AuthorizedResponse =
            self.send(self.client.get(self.url(&["authorized"]))).await?;
        Ok(response.authorized)
    }

    async fn send_code(&self, phone: &str) -> Result<LoginToken, ProviderError> {
        let response: SendCodeResponse = self
            .send(
                self.client
                    .post(self.url(&["auth", "send-code"]))
                    .json(&SendCodeRequest { phone }),
            )
            .await?;
        Ok(LoginToken(response.phone_code_hash))
    }

    async fn sign_in(
        &self,
        phone: &str,
        token: &LoginToken,
        code: &str,
    ) -> Result<(), ProviderError> {
        let request = SignInRequest {
            phone,
            phone_code_hash: &token.0,
            code,
        };
        self.send_ack(
            self.client
                .post(self.url(&["auth", "sign-in"]))
                .json(&request),
        )
        .await
    }

    async fn resolve_group(&self, group: &GroupRef) -> Result<GroupEntity, ProviderError> {
        let url = self.url(&["entities", group.as_str()]);
        let entity: EntityResponse = self.send(self.client.get(url)).await?;
        Ok(GroupEntity {
            id: entity.id,
            access_hash: entity.access_hash,
            title: entity.title,
        })
    }

    async fn participants(&self, group: &GroupEntity) -> Result<Vec<Member>, ProviderError> {
        let id = group.id.to_string();
        let mut request = self
            .client
            .get(self.url(&["groups", id.as_str(), "participants"]));
        if let Some(hash) = group.access_hash {
            request = request.query(&[("access_hash", hash)]);
        }
        let response: ParticipantsResponse = self.send(request).await?;
        Ok(response
            .participants
            .into_iter()
            .map(|p| Member {
                id: p.id,
                access_hash: p.access_hash,
                username: p.username,
            })
            .collect())
    }

    async fn invite(&self, group: &GroupEntity, member: &Member) -> Result<(), ProviderError> {
        let id = group.id.to_string();
        let request = InviteRequest {
            access_hash: group.access_hash,
            users: vec![InviteUser {
                id: member.id,
                access_hash: member.access_hash,
            }],
        };
        self.send_ack(
            self.client
                .post(self.url(&["groups", id.as_str(), "invite"]))
                .json(&request),
        )
        .await
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.send_ack(self.client.post(self.url(&["disconnect"])))
            .await?;
        if let Ok(mut guard) = self.session_id.lock() {
            *guard = None;
        }
        Ok(())
    }
}

// Bridge wire types

#[derive(Debug, Serialize)]
struct ConnectRequest<'a> {
    session: &'a str,
    api_id: i32,
    api_hash: &'a str,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct AuthorizedResponse {
    authorized: bool,
}

#[derive(Debug, Serialize)]
struct SendCodeRequest<'a> {
    phone: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendCodeResponse {
    phone_code_hash: String,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    phone: &'a str,
    phone_code_hash: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct EntityResponse {
    id: i64,
    #[serde(default)]
    access_hash: Option<i64>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParticipantsResponse {
    participants: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
struct Participant {
    id: i64,
    #[serde(default)]
    access_hash: Option<i64>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Serialize)]
struct InviteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_hash: Option<i64>,
    users: Vec<InviteUser>,
}

#[derive(Debug, Serialize)]
struct InviteUser {
    id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_hash: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BridgeErrorBody {
    error: BridgeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct BridgeErrorDetail {
    code: String,
    #[serde(default)]
    message: String,
}
