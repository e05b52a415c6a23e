use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a new HTTP client with retry middleware
    pub fn create_client(timeout: Duration) -> ClientWithMiddleware {
        // Exponential backoff, max 3 retries on transient failures
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("bikecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Build a URL with query parameters.
/// reqwest-middleware doesn't expose `.query()`, so the query string is
/// appended by hand.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, query_string)
}

fn percent_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_appended() {
        let url = build_url_with_query(
            "https://api.example.com/forecast",
            &[("lat", "53.3498"), ("lon", "-6.2603"), ("units", "metric")],
        );
        assert_eq!(
            url,
            "https://api.example.com/forecast?lat=53.3498&lon=-6.2603&units=metric"
        );
    }

    #[test]
    fn test_existing_query_and_escaping() {
        let url = build_url_with_query("http://h/p?a=1", &[("q", "St Stephen's Green")]);
        assert_eq!(url, "http://h/p?a=1&q=St%20Stephen%27s%20Green");
    }

    #[test]
    fn test_no_params() {
        let params: [(&str, &str); 0] = [];
        assert_eq!(build_url_with_query("http://h/p", &params), "http://h/p");
    }
}
