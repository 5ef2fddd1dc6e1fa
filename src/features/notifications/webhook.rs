//! # Webhook Channel
//!
//! POSTs notifications as JSON to an HTTP endpoint (push relays, home
//! automation, chat bridges).
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Client construction errors are returned instead of swapped for defaults
//! - 1.0.0: JSON POST delivery

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::time::Duration;

use super::capability::Capability;
use super::channel::{DeliveryError, Notification, NotificationChannel};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    body: &'a str,
    tag: &'a str,
    require_interaction: bool,
}

struct Endpoint {
    client: reqwest::Client,
    url: String,
}

pub struct WebhookChannel {
    endpoint: Option<Endpoint>,
}

impl WebhookChannel {
    /// Channel with a client using the default request timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self::with_client(client, url))
    }

    /// Use a preconfigured HTTP client (custom proxy, TLS or timeout settings)
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        WebhookChannel {
            endpoint: Some(Endpoint {
                client,
                url: url.into(),
            }),
        }
    }

    /// A channel with no endpoint; reports itself as unsupported
    pub fn unconfigured() -> Self {
        WebhookChannel { endpoint: None }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    fn capability_state(&self) -> Capability {
        if self.endpoint.is_some() {
            Capability::Granted
        } else {
            Capability::Unsupported
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let Some(endpoint) = &self.endpoint else {
            return Err(DeliveryError::Unsupported);
        };

        let payload = WebhookPayload {
            title: &notification.title,
            body: &notification.body,
            tag: &notification.tag,
            require_interaction: notification.require_interaction,
        };

        let response = endpoint
            .client
            .post(&endpoint.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(format!("webhook request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Transient(format!(
                "webhook returned {status}"
            )));
        }

        debug!("Webhook accepted notification {} ({status})", notification.tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn local_channel(url: String) -> WebhookChannel {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        WebhookChannel::with_client(client, url)
    }

    fn notification() -> Notification {
        Notification {
            title: "Workout".to_string(),
            body: "Time to work out, get moving!".to_string(),
            tag: "reminder-7".to_string(),
            require_interaction: true,
        }
    }

    /// Accept one connection, capture the request body, reply with `status_line`
    async fn serve_once(status_line: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/notify", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = String::new();
            let mut chunk = [0u8; 1024];
            // The payload is a single JSON object, so the request ends at its closing brace
            while !request.trim_end().ends_with('}') {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.push_str(&String::from_utf8_lossy(&chunk[..n]));
            }
            let body = request
                .split_once("\r\n\r\n")
                .map(|(_, body)| body.to_string())
                .unwrap_or_default();
            let response = format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(body);
        });

        (url, rx)
    }

    #[tokio::test]
    async fn test_unconfigured_is_unsupported() {
        let channel = WebhookChannel::unconfigured();
        assert_eq!(channel.capability_state(), Capability::Unsupported);
        assert!(matches!(
            channel.deliver(&notification()).await,
            Err(DeliveryError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn test_posts_json_payload() {
        let (url, body_rx) = serve_once("HTTP/1.1 204 No Content").await;
        let channel = local_channel(url);
        assert_eq!(channel.capability_state(), Capability::Granted);

        channel.deliver(&notification()).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&body_rx.await.unwrap()).unwrap();
        assert_eq!(body["title"], "Workout");
        assert_eq!(body["tag"], "reminder-7");
        assert_eq!(body["require_interaction"], true);
    }

    #[test]
    fn test_new_builds_client() {
        let channel = WebhookChannel::new("http://127.0.0.1:9/notify").unwrap();
        assert_eq!(channel.capability_state(), Capability::Granted);
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let (url, _body_rx) = serve_once("HTTP/1.1 503 Service Unavailable").await;
        let channel = local_channel(url);
        assert!(matches!(
            channel.deliver(&notification()).await,
            Err(DeliveryError::Transient(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let channel = local_channel(format!("http://{addr}/notify"));
        assert!(matches!(
            channel.deliver(&notification()).await,
            Err(DeliveryError::Transient(_))
        ));
    }
}
