use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::HttpConfig;
use crate::error::TransportError;

/// User agents to rotate through to avoid bot detection
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// A network request built by a source adapter. Adapters set their own
/// required headers here; the engine never injects any.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
}

impl PageRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
        }
    }

    /// Add a header, silently skipping values that are not valid header text.
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// Raw response handed back to the adapter's parser.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Executes page requests. The engine only ever talks to this trait, so
/// tests can substitute a scripted transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &PageRequest) -> Result<RawResponse, TransportError>;
}

/// HTTP transport with bot detection bypass: browser-like default headers,
/// user-agent rotation, retry with exponential backoff, and a cookie jar
/// shared across requests.
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Result<Self, reqwest::Error> {
        // Default headers that mimic a real browser; per-request headers
        // from the adapter override these.
        let mut headers = HeaderMap::new();
        headers.insert("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8".parse().unwrap());
        headers.insert("Accept-Language", "en-US,en;q=0.9".parse().unwrap());
        headers.insert("DNT", "1".parse().unwrap());
        headers.insert("Connection", "keep-alive".parse().unwrap());
        headers.insert("Upgrade-Insecure-Requests", "1".parse().unwrap());
        headers.insert("Sec-Fetch-Dest", "document".parse().unwrap());
        headers.insert("Sec-Fetch-Mode", "navigate".parse().unwrap());
        headers.insert("Sec-Fetch-Site", "none".parse().unwrap());

        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(Self::random_user_agent())
            .cookie_store(config.enable_cookies)
            .gzip(config.enable_compression)
            .brotli(config.enable_compression)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get a random user agent from the pool
    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        let index = rng.gen_range(0..USER_AGENTS.len());
        USER_AGENTS[index]
    }

    /// Calculate retry delay with exponential backoff and jitter
    fn calculate_retry_delay(&self, attempt: usize) -> Duration {
        let base_delay = self.config.initial_retry_delay_ms;
        let max_delay = self.config.max_retry_delay_ms;

        let delay_ms = (base_delay * 2u64.pow(attempt as u32)).min(max_delay);

        // Jitter to avoid thundering herd
        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(0.75..=1.25);
        let final_delay_ms = (delay_ms as f64 * jitter) as u64;

        Duration::from_millis(final_delay_ms)
    }

    /// Check if a status code is retryable
    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status.as_u16(),
            // Rate limiting
            429 |
            // Server errors
            500 | 502 | 503 | 504 |
            // Cloudflare errors
            520 | 521 | 522 | 523 | 524 | 525 | 526 | 527
        )
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: &PageRequest) -> Result<RawResponse, TransportError> {
        let mut last_error: Option<reqwest::Error> = None;

        for attempt in 0..=self.config.max_retries {
            // Rotate user agent for each attempt; adapter headers still win.
            let attempt_request = self
                .client
                .request(request.method.clone(), &request.url)
                .header("User-Agent", Self::random_user_agent())
                .headers(request.headers.clone());

            match attempt_request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if Self::is_retryable_status(status) && attempt < self.config.max_retries {
                        log::warn!(
                            "Received retryable status {} for {}, attempt {}/{}",
                            status,
                            request.url,
                            attempt + 1,
                            self.config.max_retries + 1
                        );
                        sleep(self.calculate_retry_delay(attempt)).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(TransportError::Status {
                            url: request.url.clone(),
                            status,
                        });
                    }

                    let body = response.text().await.map_err(|e| TransportError::Request {
                        url: request.url.clone(),
                        source: e,
                    })?;
                    return Ok(RawResponse { status, body });
                }
                Err(e) => {
                    let should_retry = e.is_timeout() || e.is_connect() || e.is_request();
                    if should_retry && attempt < self.config.max_retries {
                        log::warn!(
                            "Request failed for {}, attempt {}/{}: {}",
                            request.url,
                            attempt + 1,
                            self.config.max_retries + 1,
                            e
                        );
                        sleep(self.calculate_retry_delay(attempt)).await;
                        last_error = Some(e);
                        continue;
                    }
                    return Err(TransportError::Request {
                        url: request.url.clone(),
                        source: e,
                    });
                }
            }
        }

        // The final attempt always returns above.
        match last_error {
            Some(e) => Err(TransportError::Request {
                url: request.url.clone(),
                source: e,
            }),
            None => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_user_agent_comes_from_the_pool() {
        let ua1 = HttpClient::random_user_agent();
        let ua2 = HttpClient::random_user_agent();
        assert!(USER_AGENTS.contains(&ua1));
        assert!(USER_AGENTS.contains(&ua2));
    }

    #[test]
    fn retry_delay_grows_with_attempts() {
        let client = HttpClient::new().unwrap();

        let delay0 = client.calculate_retry_delay(0);
        let delay3 = client.calculate_retry_delay(3);

        assert!(delay0.as_millis() > 0);
        // With +/-25% jitter, attempt 3 (8x base, capped) always exceeds attempt 0.
        assert!(delay3.as_millis() > delay0.as_millis());
    }

    #[test]
    fn retryable_status_classification() {
        assert!(HttpClient::is_retryable_status(
            StatusCode::TOO_MANY_REQUESTS
        ));
        assert!(HttpClient::is_retryable_status(
            StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(HttpClient::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!HttpClient::is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!HttpClient::is_retryable_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn page_request_headers_accumulate() {
        let request = PageRequest::get("https://example.com/")
            .header("Referer", "https://example.com")
            .header("Cache-Control", "max-age=0");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get("Referer").unwrap(),
            "https://example.com"
        );
    }
}
