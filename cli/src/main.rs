use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokio::time::Instant;
use topbar_core::api::{
    count_map, ApiEndpoints, ApiEnvelope, ApiError, HttpSiteApi, SiteApi, NOT_LOGGED_IN_CODE,
};
use topbar_core::{
    MomentItem, MomentKind, MomentsFeedState, UnreadCounters, DM_BUCKETS, LIVE_PAGE_SIZE,
};

#[derive(Debug, Parser)]
#[command(name = "topbar-cli")]
#[command(about = "Inspect the unread counters and moments feed behind the top bar")]
struct Cli {
    /// Session cookie sent with every request
    #[arg(long, env = "TOPBAR_COOKIE")]
    cookie: Option<String>,

    /// Override the main API origin
    #[arg(long)]
    api_base_url: Option<String>,

    /// Override the message API origin
    #[arg(long)]
    message_api_base_url: Option<String>,

    /// Override the live API origin
    #[arg(long)]
    live_api_base_url: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show whether the cookie belongs to a logged-in session
    Whoami,

    /// Fetch unread notification and direct message counts
    Unread,

    /// Page through the moments feed
    Moments {
        #[arg(long, value_enum, default_value_t = KindArg::Video)]
        kind: KindArg,

        /// Pages to load before stopping
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Count moments newer than a baseline
    NewCount {
        #[arg(long, value_enum, default_value_t = KindArg::Video)]
        kind: KindArg,

        /// Update baseline from a previous page ("0" when omitted)
        #[arg(long)]
        baseline: Option<String>,
    },

    /// Refresh the unread total on an interval (runs until interrupted or --timeout)
    Poll {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 300)]
        interval: u64,

        /// Timeout in seconds (0 = run forever)
        #[arg(long, default_value_t = 0)]
        timeout: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Video,
    Article,
    Live,
}

impl From<KindArg> for MomentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Video => MomentKind::Video,
            KindArg::Article => MomentKind::Article,
            KindArg::Live => MomentKind::Live,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = client(&cli)?;

    match &cli.cmd {
        Command::Whoami => cmd_whoami(&api).await,
        Command::Unread => cmd_unread(&api).await,
        Command::Moments { kind, pages } => cmd_moments(&api, (*kind).into(), *pages).await,
        Command::NewCount { kind, baseline } => {
            cmd_new_count(&api, (*kind).into(), baseline.clone()).await
        }
        Command::Poll { interval, timeout } => cmd_poll(&api, *interval, *timeout).await,
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn client(cli: &Cli) -> anyhow::Result<HttpSiteApi> {
    let mut endpoints = ApiEndpoints::default();
    if let Some(url) = &cli.api_base_url {
        endpoints.api_base_url = url.clone();
    }
    if let Some(url) = &cli.message_api_base_url {
        endpoints.message_api_base_url = url.clone();
    }
    if let Some(url) = &cli.live_api_base_url {
        endpoints.live_api_base_url = url.clone();
    }
    HttpSiteApi::new(endpoints, cli.cookie.as_deref()).context("build http client")
}

fn print(v: serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(&v).expect("json encode"));
}

fn item_json(item: &MomentItem) -> serde_json::Value {
    json!({
        "kind": item.kind.api_type(),
        "title": item.title,
        "author": item.author_name,
        "published": item.publish_time,
        "link": item.link_url,
        "resource_id": item.resource_id,
    })
}

fn counts_json(counts: &HashMap<String, u32>) -> serde_json::Value {
    json!(counts)
}

fn counts_from(
    source: &'static str,
    result: Result<ApiEnvelope<serde_json::Value>, ApiError>,
) -> Option<HashMap<String, u32>> {
    match result
        .and_then(ApiEnvelope::into_data)
        .and_then(|value| count_map(&value))
    {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::warn!(source, err = %e, "unread counts fetch failed");
            None
        }
    }
}

/// A failed source leaves its map empty; only both failing is an error.
async fn fetch_unread(api: &HttpSiteApi) -> anyhow::Result<UnreadCounters> {
    let (messages, dms) = tokio::join!(
        api.unread_notification_counts(),
        api.unread_direct_message_counts()
    );
    let message_counts = counts_from("notifications", messages);
    let mut dm_counts = counts_from("direct_messages", dms);
    if message_counts.is_none() && dm_counts.is_none() {
        anyhow::bail!("both unread count sources failed");
    }
    if let Some(counts) = dm_counts.as_mut() {
        counts.retain(|bucket, _| DM_BUCKETS.contains(&bucket.as_str()));
    }
    Ok(UnreadCounters {
        message_counts: message_counts.unwrap_or_default(),
        dm_counts: dm_counts.unwrap_or_default(),
    })
}

fn unread_json(counters: &UnreadCounters) -> serde_json::Value {
    json!({
        "total_unread": counters.total_unread(),
        "messages": counts_json(&counters.message_counts),
        "direct_messages": counts_json(&counters.dm_counts),
    })
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

async fn cmd_whoami(api: &HttpSiteApi) -> anyhow::Result<()> {
    let envelope = api.user_info().await.context("fetch user info")?;
    if envelope.code == NOT_LOGGED_IN_CODE {
        print(json!({ "logged_in": false }));
        return Ok(());
    }
    let info = envelope.into_data()?;
    print(json!({
        "logged_in": info.is_login,
        "mid": info.mid,
        "name": info.uname,
        "avatar": info.face,
    }));
    Ok(())
}

async fn cmd_unread(api: &HttpSiteApi) -> anyhow::Result<()> {
    let counters = fetch_unread(api).await?;
    print(unread_json(&counters));
    Ok(())
}

async fn cmd_moments(api: &HttpSiteApi, kind: MomentKind, pages: u32) -> anyhow::Result<()> {
    let mut feed = MomentsFeedState::new(kind);
    for _ in 0..pages {
        if !feed.try_begin_page_fetch() {
            break;
        }
        let appended = if kind.is_live() {
            let data = api
                .live_moments_page(feed.live_page, LIVE_PAGE_SIZE)
                .await
                .and_then(ApiEnvelope::into_data)
                .with_context(|| format!("fetch live page {}", feed.live_page))?;
            feed.finish_fetch();
            feed.apply_live_page(data.list.into_iter().map(|i| i.into_item()).collect())
        } else {
            let data = api
                .moments_page(feed.next_query())
                .await
                .and_then(ApiEnvelope::into_data)
                .context("fetch moments page")?;
            feed.finish_fetch();
            feed.apply_page(data.into_page(kind))
        };
        tracing::info!(appended, has_more = feed.has_more, "page loaded");
    }

    print(json!({
        "kind": kind.api_type(),
        "has_more": feed.has_more,
        "update_baseline": feed.update_baseline,
        "offset": feed.offset,
        "items": feed.items.iter().map(item_json).collect::<Vec<_>>(),
    }));
    Ok(())
}

async fn cmd_new_count(
    api: &HttpSiteApi,
    kind: MomentKind,
    baseline: Option<String>,
) -> anyhow::Result<()> {
    let baseline = baseline.unwrap_or_else(|| "0".to_string());
    let data = api
        .moments_update(kind, baseline.clone())
        .await
        .and_then(ApiEnvelope::into_data)
        .context("fetch new moments count")?;
    print(json!({
        "kind": kind.api_type(),
        "baseline": baseline,
        "new_items": data.update_num,
    }));
    Ok(())
}

async fn cmd_poll(api: &HttpSiteApi, interval: u64, timeout: u64) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let deadline = (timeout > 0).then(|| Instant::now() + Duration::from_secs(timeout));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = sleep_until(deadline) => return Ok(()),
        }
        match fetch_unread(api).await {
            Ok(counters) => {
                let line = unread_json(&counters);
                println!("{}", serde_json::to_string(&line)?);
            }
            Err(e) => tracing::warn!(err = %e, "unread refresh failed"),
        }
    }
}
