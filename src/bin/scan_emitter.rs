//! Synthetic RFID reader: posts the same scan to the inventory API on a fixed
//! interval until interrupted. Failed scans are logged and dropped.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct EmitterConfig {
    api_url: String,
    tag: String,
    action: String,
    interval: Duration,
}

impl EmitterConfig {
    fn from_env() -> anyhow::Result<Self> {
        let action = std::env::var("SCAN_ACTION").unwrap_or_else(|_| "remove".to_string());
        if action != "add" && action != "remove" {
            anyhow::bail!("SCAN_ACTION must be \"add\" or \"remove\", got {:?}", action);
        }

        let interval_secs: u64 = std::env::var("SCAN_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("SCAN_INTERVAL_SECS must be a whole number of seconds")?;
        if interval_secs == 0 {
            anyhow::bail!("SCAN_INTERVAL_SECS must be > 0");
        }

        Ok(Self {
            api_url: std::env::var("SCAN_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            tag: std::env::var("SCAN_TAG").unwrap_or_else(|_| "TAG002".to_string()),
            action,
            interval: Duration::from_secs(interval_secs),
        })
    }

    fn scan_url(&self) -> String {
        format!("{}/scan", self.api_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ScanReply {
    new_quantity: i64,
}

async fn emit_once(client: &reqwest::Client, config: &EmitterConfig) -> anyhow::Result<i64> {
    let resp = client
        .post(config.scan_url())
        .json(&json!({ "tag_id": config.tag, "action": config.action }))
        .send()
        .await
        .context("scan request failed")?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("API answered {}: {}", status, body);
    }

    let reply: ScanReply = resp.json().await.context("unreadable scan response")?;
    Ok(reply.new_quantity)
}

/// Ticker that never fires missed scans back to back: a slow reply pushes the
/// next scan a full interval out.
fn scan_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Post scans until `shutdown` resolves, including while a request is in
/// flight. Returns how many scans were attempted.
async fn run(
    client: &reqwest::Client,
    config: &EmitterConfig,
    shutdown: impl Future<Output = ()>,
) -> usize {
    let mut ticker = scan_ticker(config.interval);
    // First tick fires immediately; the reader waits one interval before scanning.
    ticker.tick().await;

    tokio::pin!(shutdown);
    let mut attempted = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(attempted, "Interrupted, stopping emitter");
                break;
            }
            result = async {
                ticker.tick().await;
                emit_once(client, config).await
            } => {
                attempted += 1;
                match result {
                    Ok(new_quantity) => info!(
                        tag = %config.tag,
                        action = %config.action,
                        new_quantity,
                        "Scanned"
                    ),
                    Err(e) => warn!(error = %format!("{e:#}"), "Scan dropped"),
                }
            }
        }
    }

    attempted
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = EmitterConfig::from_env()?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;

    info!(
        url = %config.scan_url(),
        tag = %config.tag,
        action = %config.action,
        interval_secs = config.interval.as_secs(),
        "Starting scan emitter"
    );

    run(&client, &config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> EmitterConfig {
        EmitterConfig {
            api_url: api_url.to_string(),
            tag: "TAG002".to_string(),
            action: "remove".to_string(),
            interval: Duration::from_secs(5),
        }
    }

    #[test]
    fn scan_url_joins_without_double_slash() {
        assert_eq!(config("http://localhost:5000/api").scan_url(), "http://localhost:5000/api/scan");
        assert_eq!(config("http://localhost:5000/api/").scan_url(), "http://localhost:5000/api/scan");
    }

    #[tokio::test]
    async fn unreachable_api_is_reported_not_retried() {
        let client = reqwest::Client::new();
        let err = emit_once(&client, &config("http://127.0.0.1:1/api")).await.unwrap_err();
        assert!(format!("{err:#}").contains("scan request failed"));
    }

    #[tokio::test]
    async fn successful_scan_returns_new_quantity() {
        use axum::{routing::post, Json, Router};

        let app = Router::new().route(
            "/api/scan",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["tag_id"], "TAG002");
                assert_eq!(body["action"], "remove");
                Json(json!({ "message": "Updated", "new_quantity": 7 }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();
        let qty = emit_once(&client, &config(&format!("http://{addr}/api")))
            .await
            .unwrap();
        assert_eq!(qty, 7);

        server.abort();
    }

    #[tokio::test]
    async fn ticker_delays_instead_of_bursting() {
        let ticker = scan_ticker(Duration::from_secs(5));
        assert_eq!(ticker.missed_tick_behavior(), MissedTickBehavior::Delay);
    }

    #[tokio::test]
    async fn shutdown_interrupts_an_in_flight_scan() {
        use axum::{routing::post, Json, Router};

        let app = Router::new().route(
            "/api/scan",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({ "message": "Updated", "new_quantity": 0 }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut cfg = config(&format!("http://{addr}/api"));
        cfg.interval = Duration::from_millis(20);
        let client = reqwest::Client::new();

        let attempted = tokio::time::timeout(
            Duration::from_secs(5),
            run(&client, &cfg, tokio::time::sleep(Duration::from_millis(200))),
        )
        .await
        .expect("emitter must stop while a scan is still pending");
        assert_eq!(attempted, 0);

        server.abort();
    }
}
