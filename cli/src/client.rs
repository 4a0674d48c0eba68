use crate::error::Error;
use eyre::WrapErr;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

/// Dashboard API client, authorized with the session token
#[derive(Clone)]
pub(crate) struct Client {
    api_base: String,
    access_token: String,
    client: reqwest::Client,
}

impl Client {
    pub(crate) fn new(api_base: &str, access_token: &str) -> Self {
        Self::with_http(api_base, access_token, reqwest::Client::new())
    }

    fn with_http(api_base: &str, access_token: &str, client: reqwest::Client) -> Self {
        Client {
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            client,
        }
    }

    /// Incapsulate a typical GET request with query parameters
    pub(crate) async fn get<R>(&self, path: &str, query: &[(&str, &str)]) -> eyre::Result<R>
    where
        R: DeserializeOwned,
    {
        let url = Url::parse_with_params(&format!("{}{path}", self.api_base), query)
            .wrap_err(format!("Invalid dashboard URL for {path}"))?;

        let result = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .inspect_err(|err| log::error!("{err:?}"))
            .wrap_err(Error::new(
                "Network request failed",
                Some("Try again in a few seconds."),
            ))?;

        let status = result.status();
        let text = result.text().await?;
        log::debug!("Got status from {path}: {status}");
        log::debug!("Got response from {path}: {text}");
        check_status(status)?;

        serde_json::from_str(&text)
            .inspect_err(|e| log::error!("Could not parse response from {path}: {e:?}"))
            .wrap_err("Could not parse")
    }
}

fn check_status(status: StatusCode) -> Result<(), Error> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::new(
            "Dashboard authorization failed",
            Some("Log in to the dashboard again and retry."),
        ));
    }

    if status != StatusCode::OK {
        return Err(Error::new("Request failed", Some("Try again in a few seconds.")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single request with a canned response, yielding the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];

            // GET carries no body, the head ends with an empty line
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = socket.read(&mut buffer).await.unwrap();

                if read == 0 {
                    break;
                }

                request.extend_from_slice(&buffer[..read]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );

            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        (base, handle)
    }

    fn client(base: &str) -> Client {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        Client::with_http(base, "token", http)
    }

    #[tokio::test]
    async fn sends_authorized_query() {
        let (base, server) = serve_once("200 OK", r#"{"result":[]}"#).await;

        let response: Value = client(&base)
            .get("/core/orgs/acme/providers/instance", &[("app", "shop"), ("stage", "dev")])
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert_eq!(response["result"], Value::Array(vec![]));
        assert!(request.starts_with("GET /core/orgs/acme/providers/instance?app=shop&stage=dev "));
        assert!(request.to_lowercase().contains("authorization: bearer token"));
    }

    #[tokio::test]
    async fn rejected_token_is_an_auth_error() {
        for status in ["401 Unauthorized", "403 Forbidden"] {
            let (base, server) = serve_once(status, "{}").await;
            let error = client(&base).get::<Value>("/core", &[]).await.unwrap_err();
            server.await.unwrap();

            assert_eq!(
                Error::from(error).message(),
                "Dashboard authorization failed"
            );
        }
    }

    #[tokio::test]
    async fn server_error_fails_the_request() {
        let (base, server) = serve_once("500 Internal Server Error", "{}").await;
        let error = client(&base).get::<Value>("/core", &[]).await.unwrap_err();
        server.await.unwrap();
        assert_eq!(Error::from(error).message(), "Request failed");
    }

    #[test]
    fn only_ok_passes() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::NOT_FOUND).is_err());
        assert!(check_status(StatusCode::FORBIDDEN).is_err());
    }
}
