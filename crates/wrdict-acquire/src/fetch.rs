use anyhow::{Context, Result};
use rand::Rng;
use reqwest::{Client, StatusCode, Url};
use std::future::Future;
use std::time::Duration;

/// Browser user agent; the dictionary serves reduced pages to unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of dictionary pages.
///
/// `Ok(None)` means the page does not exist (HTTP 404), which is an answer
/// for the term rather than a failure. Anything else that is not a page is
/// an error and makes the collection pass retry.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Option<String>>>;
}

/// Fetches pages over HTTP, rotating through a proxy pool when one is given.
pub struct HttpFetcher {
    /// One client per proxy, or a single direct client. Never empty.
    clients: Vec<Client>,
}

impl HttpFetcher {
    pub fn new(proxies: &[String], timeout: Duration) -> Result<Self> {
        let clients = if proxies.is_empty() {
            vec![build_client(None, timeout)?]
        } else {
            proxies
                .iter()
                .map(|p| build_client(Some(p), timeout))
                .collect::<Result<Vec<_>>>()?
        };
        tracing::debug!(clients = clients.len(), "Built HTTP clients");
        Ok(Self { clients })
    }

    fn client(&self) -> &Client {
        let index = rand::rng().random_range(0..self.clients.len());
        &self.clients[index]
    }
}

fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT).timeout(timeout);
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy).with_context(|| format!("Invalid proxy URL {proxy}"))?;
        builder = builder.proxy(proxy);
    }
    builder.build().context("Failed to build HTTP client")
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Option<String>> {
        let response = self
            .client()
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%url, "Page not found");
            return Ok(None);
        }
        anyhow::ensure!(status.is_success(), "HTTP {status} for {url}");

        let body = response.text().await.context("Failed to read response body")?;
        tracing::trace!(%url, bytes = body.len(), "Received HTML");
        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_client() {
        let fetcher = HttpFetcher::new(&[], DEFAULT_TIMEOUT).unwrap();
        assert_eq!(fetcher.clients.len(), 1);
    }

    #[test]
    fn test_one_client_per_proxy() {
        let proxies = vec!["http://10.0.0.1:8080".to_string(), "http://10.0.0.2:3128".to_string()];
        let fetcher = HttpFetcher::new(&proxies, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(fetcher.clients.len(), 2);
    }

    #[test]
    fn test_invalid_proxy() {
        let proxies = vec!["http://[::1".to_string()];
        assert!(HttpFetcher::new(&proxies, DEFAULT_TIMEOUT).is_err());
    }

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(status: &'static str, body: &'static str) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        Url::parse(&format!("http://{addr}/enfr/cat")).unwrap()
    }

    fn local_fetcher() -> HttpFetcher {
        let client = Client::builder().no_proxy().timeout(DEFAULT_TIMEOUT).build().unwrap();
        HttpFetcher { clients: vec![client] }
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let url = serve_once("200 OK", "<table class=\"WRD\"></table>").await;
        let page = local_fetcher().fetch(&url).await.unwrap();
        assert_eq!(page.as_deref(), Some("<table class=\"WRD\"></table>"));
    }

    #[tokio::test]
    async fn test_not_found_is_no_page() {
        let url = serve_once("404 Not Found", "no such word").await;
        assert_eq!(local_fetcher().fetch(&url).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_fails() {
        let url = serve_once("503 Service Unavailable", "slow down").await;
        let err = local_fetcher().fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("503"), "{err:#}");
    }
}
