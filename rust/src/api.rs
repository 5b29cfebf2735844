use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, REFERER};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::state::{MomentItem, MomentKind, MomentsPage, UserInfo};

/// Returned by the nav endpoint when the cookie does not carry a session.
pub const NOT_LOGGED_IN_CODE: i64 = -101;

const DEFAULT_API_BASE_URL: &str = "https://api.bilibili.com";
const DEFAULT_MESSAGE_API_BASE_URL: &str = "https://api.vc.bilibili.com";
const DEFAULT_LIVE_API_BASE_URL: &str = "https://api.live.bilibili.com";
const SITE_ORIGIN: &str = "https://www.bilibili.com";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("api error {code}: {message}")]
    Domain { code: i64, message: String },
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("network disabled")]
    Offline,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Every endpoint wraps its payload as `{ code, message, data }`; `code == 0` is success.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: "0".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// For endpoints that answer with a bare status and no payload.
    pub fn into_status(self) -> Result<(), ApiError> {
        if self.code != 0 {
            return Err(ApiError::Domain {
                code: self.code,
                message: self.message,
            });
        }
        Ok(())
    }

    pub fn into_data(self) -> Result<T, ApiError> {
        if self.code != 0 {
            return Err(ApiError::Domain {
                code: self.code,
                message: self.message,
            });
        }
        self.data
            .ok_or_else(|| ApiError::Malformed("missing data".to_string()))
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserInfoPayload {
    #[serde(rename = "isLogin")]
    pub is_login: bool,
    pub mid: u64,
    pub uname: String,
    pub face: String,
}

impl From<UserInfoPayload> for UserInfo {
    fn from(p: UserInfoPayload) -> Self {
        UserInfo {
            mid: p.mid,
            name: p.uname,
            avatar_url: p.face,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MomentAuthorPayload {
    pub name: String,
    pub face: String,
    pub jump_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MomentPayload {
    pub title: String,
    pub author: MomentAuthorPayload,
    #[serde(deserialize_with = "lenient_string")]
    pub pub_time: String,
    pub cover: String,
    pub jump_url: String,
    pub rid: u64,
}

impl MomentPayload {
    pub fn into_item(self, kind: MomentKind) -> MomentItem {
        MomentItem {
            kind,
            title: self.title,
            author_name: self.author.name,
            author_avatar_url: self.author.face,
            author_link_url: Some(self.author.jump_url),
            publish_time: self.pub_time,
            cover_image_url: self.cover,
            link_url: self.jump_url,
            resource_id: Some(self.rid),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MomentsPagePayload {
    pub has_more: bool,
    pub items: Vec<MomentPayload>,
    #[serde(deserialize_with = "lenient_string")]
    pub offset: String,
    #[serde(deserialize_with = "lenient_string")]
    pub update_baseline: String,
}

impl MomentsPagePayload {
    pub fn into_page(self, kind: MomentKind) -> MomentsPage {
        MomentsPage {
            has_more: self.has_more,
            items: self
                .items
                .into_iter()
                .map(|item| item.into_item(kind))
                .collect(),
            update_baseline: self.update_baseline,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MomentsUpdatePayload {
    pub update_num: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LiveMomentPayload {
    pub title: String,
    pub uname: String,
    pub face: String,
    pub pic: String,
    pub link: String,
}

impl LiveMomentPayload {
    pub fn into_item(self) -> MomentItem {
        MomentItem {
            kind: MomentKind::Live,
            title: self.title,
            author_name: self.uname,
            author_avatar_url: self.face,
            author_link_url: None,
            publish_time: String::new(),
            cover_image_url: self.pic,
            link_url: self.link,
            resource_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LiveMomentsPayload {
    pub list: Vec<LiveMomentPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MomentsQuery {
    pub kind: MomentKind,
    pub update_baseline: Option<String>,
    pub offset: Option<String>,
}

/// Reads a `{category: count}` object. Non-numeric entries are skipped.
pub fn count_map(value: &serde_json::Value) -> Result<HashMap<String, u32>, ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ApiError::Malformed("expected an object of counts".to_string()))?;
    Ok(obj
        .iter()
        .filter_map(|(k, v)| {
            v.as_u64()
                .map(|n| (k.clone(), u32::try_from(n).unwrap_or(u32::MAX)))
        })
        .collect())
}

#[async_trait]
pub trait SiteApi: Send + Sync + 'static {
    async fn user_info(&self) -> Result<ApiEnvelope<UserInfoPayload>, ApiError>;

    async fn unread_notification_counts(
        &self,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError>;

    async fn unread_direct_message_counts(
        &self,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError>;

    async fn moments_page(
        &self,
        query: MomentsQuery,
    ) -> Result<ApiEnvelope<MomentsPagePayload>, ApiError>;

    async fn moments_update(
        &self,
        kind: MomentKind,
        update_baseline: String,
    ) -> Result<ApiEnvelope<MomentsUpdatePayload>, ApiError>;

    async fn live_moments_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ApiEnvelope<LiveMomentsPayload>, ApiError>;

    async fn add_to_watch_later(
        &self,
        aid: u64,
        csrf: String,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError>;

    async fn remove_from_watch_later(
        &self,
        aid: u64,
        csrf: String,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError>;
}

pub type SharedSiteApi = Arc<RwLock<Arc<dyn SiteApi>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub api_base_url: String,
    pub message_api_base_url: String,
    pub live_api_base_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            message_api_base_url: DEFAULT_MESSAGE_API_BASE_URL.to_string(),
            live_api_base_url: DEFAULT_LIVE_API_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpSiteApi {
    client: reqwest::Client,
    endpoints: ApiEndpoints,
}

impl HttpSiteApi {
    pub fn new(endpoints: ApiEndpoints, cookie: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(SITE_ORIGIN));
        headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
        if let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) {
            let mut value = HeaderValue::from_str(cookie)
                .map_err(|e| ApiError::Malformed(format!("cookie header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("topbar-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoints })
    }

    fn api(&self, path: &str) -> String {
        format!("{}{path}", self.endpoints.api_base_url.trim_end_matches('/'))
    }

    fn message_api(&self, path: &str) -> String {
        format!(
            "{}{path}",
            self.endpoints.message_api_base_url.trim_end_matches('/')
        )
    }

    fn live_api(&self, path: &str) -> String {
        format!(
            "{}{path}",
            self.endpoints.live_api_base_url.trim_end_matches('/')
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<ApiEnvelope<T>>().await?)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: String,
        form: &[(&str, String)],
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let resp = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<ApiEnvelope<T>>().await?)
    }
}

#[async_trait]
impl SiteApi for HttpSiteApi {
    async fn user_info(&self) -> Result<ApiEnvelope<UserInfoPayload>, ApiError> {
        self.get(self.api("/x/web-interface/nav"), &[]).await
    }

    async fn unread_notification_counts(
        &self,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        self.get(self.message_api("/x/im/web/msgfeed/unread"), &[])
            .await
    }

    async fn unread_direct_message_counts(
        &self,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        self.get(
            self.message_api("/session_svr/v1/session_svr/single_unread"),
            &[
                ("unread_type", "0".to_string()),
                ("build", "0".to_string()),
                ("mobi_app", "web".to_string()),
            ],
        )
        .await
    }

    async fn moments_page(
        &self,
        query: MomentsQuery,
    ) -> Result<ApiEnvelope<MomentsPagePayload>, ApiError> {
        let mut params = vec![("type", query.kind.api_type().to_string())];
        if let Some(baseline) = query.update_baseline {
            params.push(("update_baseline", baseline));
        }
        if let Some(offset) = query.offset {
            params.push(("offset", offset));
        }
        self.get(self.api("/x/polymer/web-dynamic/v1/feed/nav"), &params)
            .await
    }

    async fn moments_update(
        &self,
        kind: MomentKind,
        update_baseline: String,
    ) -> Result<ApiEnvelope<MomentsUpdatePayload>, ApiError> {
        self.get(
            self.api("/x/polymer/web-dynamic/v1/feed/all/update"),
            &[
                ("type", kind.api_type().to_string()),
                ("update_baseline", update_baseline),
            ],
        )
        .await
    }

    async fn live_moments_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ApiEnvelope<LiveMomentsPayload>, ApiError> {
        self.get(
            self.live_api("/xlive/web-ucenter/v1/xfetter/GetWebList"),
            &[
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
            ],
        )
        .await
    }

    async fn add_to_watch_later(
        &self,
        aid: u64,
        csrf: String,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        self.post_form(
            self.api("/x/v2/history/toview/add"),
            &[("aid", aid.to_string()), ("csrf", csrf)],
        )
        .await
    }

    async fn remove_from_watch_later(
        &self,
        aid: u64,
        csrf: String,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        self.post_form(
            self.api("/x/v2/history/toview/del"),
            &[("aid", aid.to_string()), ("csrf", csrf)],
        )
        .await
    }
}

/// Stand-in used when networking is disabled; every call fails with `Offline`.
#[derive(Debug, Clone, Default)]
pub struct OfflineSiteApi;

#[async_trait]
impl SiteApi for OfflineSiteApi {
    async fn user_info(&self) -> Result<ApiEnvelope<UserInfoPayload>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn unread_notification_counts(
        &self,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn unread_direct_message_counts(
        &self,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn moments_page(
        &self,
        _query: MomentsQuery,
    ) -> Result<ApiEnvelope<MomentsPagePayload>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn moments_update(
        &self,
        _kind: MomentKind,
        _update_baseline: String,
    ) -> Result<ApiEnvelope<MomentsUpdatePayload>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn live_moments_page(
        &self,
        _page: u32,
        _page_size: u32,
    ) -> Result<ApiEnvelope<LiveMomentsPayload>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn add_to_watch_later(
        &self,
        _aid: u64,
        _csrf: String,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn remove_from_watch_later(
        &self,
        _aid: u64,
        _csrf: String,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        Err(ApiError::Offline)
    }
}
