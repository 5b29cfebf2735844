#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use topbar_core::api::{
    ApiEnvelope, ApiError, LiveMomentsPayload, MomentsPagePayload, MomentsQuery,
    MomentsUpdatePayload, SiteApi, UserInfoPayload,
};
use topbar_core::MomentKind;

/// Wraps `data` the way the site does; `None` simulates a transport failure.
fn respond<T: DeserializeOwned>(data: Option<Value>) -> Result<ApiEnvelope<T>, ApiError> {
    match data {
        Some(data) => Ok(serde_json::from_value(json!({
            "code": 0,
            "message": "0",
            "data": data,
        }))
        .expect("scripted payload")),
        None => Err(ApiError::Transport("scripted failure".to_string())),
    }
}

pub fn feed_page(has_more: bool, titles: &[&str], baseline: &str, offset: &str) -> Value {
    let items: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({
                "title": title,
                "author": {"name": "up", "face": "face.jpg", "jump_url": "//space.bilibili.com/1"},
                "pub_time": "1 hour ago",
                "cover": format!("{title}.jpg"),
                "jump_url": format!("//www.bilibili.com/video/{title}"),
                "rid": i as u64 + 1,
            })
        })
        .collect();
    json!({
        "has_more": has_more,
        "items": items,
        "update_baseline": baseline,
        "offset": offset,
    })
}

fn live_page(len: usize) -> Value {
    let list: Vec<Value> = (0..len)
        .map(|i| {
            json!({
                "title": format!("live-{i}"),
                "uname": "host",
                "face": "face.jpg",
                "pic": "pic.jpg",
                "link": format!("//live.bilibili.com/{i}"),
            })
        })
        .collect();
    json!({ "list": list })
}

pub struct MockSiteApi {
    pub logged_in: AtomicBool,
    pub notifications: Mutex<Option<Value>>,
    pub dms: Mutex<Option<Value>>,
    pub unread_calls: AtomicUsize,

    /// Popped per request; an empty queue answers "no more content".
    pub feed_pages: Mutex<VecDeque<Option<Value>>>,
    pub feed_queries: Mutex<Vec<MomentsQuery>>,
    pub feed_delay: Mutex<Duration>,

    /// Item count per live page; `None` fails the request.
    pub live_pages: Mutex<VecDeque<Option<usize>>>,
    pub live_requests: Mutex<Vec<(u32, u32)>>,

    pub update_num: AtomicU32,
    pub update_requests: Mutex<Vec<(MomentKind, String)>>,

    pub watch_later_calls: Mutex<Vec<(bool, u64, String)>>,
}

impl Default for MockSiteApi {
    fn default() -> Self {
        Self {
            logged_in: AtomicBool::new(true),
            notifications: Mutex::new(Some(json!({}))),
            dms: Mutex::new(Some(json!({}))),
            unread_calls: AtomicUsize::new(0),
            feed_pages: Mutex::new(VecDeque::new()),
            feed_queries: Mutex::new(Vec::new()),
            feed_delay: Mutex::new(Duration::ZERO),
            live_pages: Mutex::new(VecDeque::new()),
            live_requests: Mutex::new(Vec::new()),
            update_num: AtomicU32::new(0),
            update_requests: Mutex::new(Vec::new()),
            watch_later_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockSiteApi {
    pub fn logged_out() -> Self {
        Self {
            logged_in: AtomicBool::new(false),
            ..Default::default()
        }
    }

    pub fn with_unread(notifications: Value, dms: Value) -> Self {
        Self {
            notifications: Mutex::new(Some(notifications)),
            dms: Mutex::new(Some(dms)),
            ..Default::default()
        }
    }

    pub fn set_unread(&self, notifications: Option<Value>, dms: Option<Value>) {
        *self.notifications.lock().unwrap() = notifications;
        *self.dms.lock().unwrap() = dms;
    }

    pub fn push_feed_page(&self, page: Option<Value>) {
        self.feed_pages.lock().unwrap().push_back(page);
    }

    pub fn push_live_page(&self, len: Option<usize>) {
        self.live_pages.lock().unwrap().push_back(len);
    }

    pub fn set_feed_delay(&self, delay: Duration) {
        *self.feed_delay.lock().unwrap() = delay;
    }

    pub fn feed_queries(&self) -> Vec<MomentsQuery> {
        self.feed_queries.lock().unwrap().clone()
    }

    pub fn live_requests(&self) -> Vec<(u32, u32)> {
        self.live_requests.lock().unwrap().clone()
    }

    pub fn update_requests(&self) -> Vec<(MomentKind, String)> {
        self.update_requests.lock().unwrap().clone()
    }

    pub fn unread_calls(&self) -> usize {
        self.unread_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteApi for MockSiteApi {
    async fn user_info(&self) -> Result<ApiEnvelope<UserInfoPayload>, ApiError> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Ok(serde_json::from_value(json!({
                "code": -101,
                "message": "账号未登录",
                "data": {"isLogin": false},
            }))
            .expect("scripted payload"));
        }
        respond(Some(json!({
            "isLogin": true,
            "mid": 42,
            "uname": "tester",
            "face": "https://i0.hdslb.com/face.jpg",
        })))
    }

    async fn unread_notification_counts(&self) -> Result<ApiEnvelope<Value>, ApiError> {
        self.unread_calls.fetch_add(1, Ordering::SeqCst);
        respond(self.notifications.lock().unwrap().clone())
    }

    async fn unread_direct_message_counts(&self) -> Result<ApiEnvelope<Value>, ApiError> {
        respond(self.dms.lock().unwrap().clone())
    }

    async fn moments_page(
        &self,
        query: MomentsQuery,
    ) -> Result<ApiEnvelope<MomentsPagePayload>, ApiError> {
        self.feed_queries.lock().unwrap().push(query);
        let page = self
            .feed_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Some(feed_page(false, &[], "", "")));
        let delay = *self.feed_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        respond(page)
    }

    async fn moments_update(
        &self,
        kind: MomentKind,
        update_baseline: String,
    ) -> Result<ApiEnvelope<MomentsUpdatePayload>, ApiError> {
        self.update_requests
            .lock()
            .unwrap()
            .push((kind, update_baseline));
        respond(Some(json!({
            "update_num": self.update_num.load(Ordering::SeqCst),
        })))
    }

    async fn live_moments_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ApiEnvelope<LiveMomentsPayload>, ApiError> {
        self.live_requests.lock().unwrap().push((page, page_size));
        let len = self.live_pages.lock().unwrap().pop_front().unwrap_or(Some(0));
        respond(len.map(live_page))
    }

    async fn add_to_watch_later(
        &self,
        aid: u64,
        csrf: String,
    ) -> Result<ApiEnvelope<Value>, ApiError> {
        self.watch_later_calls
            .lock()
            .unwrap()
            .push((true, aid, csrf));
        Ok(serde_json::from_value(json!({"code": 0, "message": "0", "ttl": 1})).expect("status"))
    }

    async fn remove_from_watch_later(
        &self,
        aid: u64,
        csrf: String,
    ) -> Result<ApiEnvelope<Value>, ApiError> {
        self.watch_later_calls
            .lock()
            .unwrap()
            .push((false, aid, csrf));
        Ok(serde_json::from_value(json!({"code": 0, "message": "0", "ttl": 1})).expect("status"))
    }
}
