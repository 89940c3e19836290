//! Live feed client over HTTPS.

use core::future::Future;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::feed::FetchError;
use crate::traits::FeedSource;
use crate::vehicle::Line;

/// Feed source fetching trips-for-route documents with reqwest.
#[derive(Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpFeed {
    /// Creates a client for the configured API.
    ///
    /// The client-level timeout matches `request_timeout_ms`; the fetcher
    /// applies the same bound around each call.
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_millis(u64::from(config.request_timeout_ms));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linklight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
            api_key: config.api_key.as_str().to_owned(),
            timeout,
        })
    }

    fn transport_error(e: reqwest::Error, timeout: Duration) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Transport(e.without_url().to_string())
        }
    }

    /// Request URL for one line.
    pub fn request_url(&self, line: Line) -> String {
        format!(
            "{}/trips-for-route/{}.json?key={}&includeStatus=true",
            self.base_url,
            line.route_id(),
            self.api_key
        )
    }
}

impl FeedSource for HttpFeed {
    fn describe(&self) -> &str {
        &self.base_url
    }

    fn fetch_line(&self, line: Line) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        let request = self.client.get(self.request_url(line));
        let timeout = self.timeout;
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| Self::transport_error(e, timeout))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| Self::transport_error(e, timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_trips_for_route_url() {
        let config = FeedConfig::default()
            .with_api_base_url("https://example.test/api/where/")
            .with_api_key("k3y");
        let feed = HttpFeed::new(&config).unwrap();
        assert_eq!(
            feed.request_url(Line::One),
            "https://example.test/api/where/trips-for-route/40_100479.json?key=k3y&includeStatus=true"
        );
        assert_eq!(
            feed.request_url(Line::Two),
            "https://example.test/api/where/trips-for-route/40_2LINE.json?key=k3y&includeStatus=true"
        );
    }

    #[test]
    fn serves_both_lines() {
        let feed = HttpFeed::new(&FeedConfig::default()).unwrap();
        assert_eq!(feed.lines(), &Line::ALL);
        assert_eq!(feed.describe(), "https://api.pugetsound.onebusaway.org/api/where");
    }

    #[tokio::test]
    async fn silent_server_reports_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let config = FeedConfig::default()
            .with_api_base_url(&format!("http://{}", addr))
            .with_api_key("k3y")
            .with_request_timeout_ms(200);
        let feed = HttpFeed::new(&config).unwrap();
        assert_eq!(
            feed.fetch_line(Line::One).await,
            Err(FetchError::Timeout(Duration::from_millis(200)))
        );
        server.abort();
    }
}
