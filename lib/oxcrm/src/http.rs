use oxhttp::model::header::{ACCEPT, CONTENT_TYPE};
use oxhttp::model::Request;
use std::io::{Error, ErrorKind, Read, Result};
use std::time::Duration;

/// Blocking HTTP client used to download schemas.
pub struct Client {
    client: oxhttp::Client,
}

impl Client {
    pub fn new(timeout: Option<Duration>, redirection_limit: usize) -> Result<Self> {
        let mut client = oxhttp::Client::new()
            .with_redirection_limit(redirection_limit)
            .with_user_agent(concat!("oxcrm/", env!("CARGO_PKG_VERSION")))
            .map_err(invalid_input_error)?;
        if let Some(timeout) = timeout {
            client = client.with_global_timeout(timeout);
        }
        Ok(Self { client })
    }

    /// Downloads the document and returns its media type, if any, with its content.
    pub fn get(&self, url: &str, accept: &'static str) -> Result<(Option<String>, Vec<u8>)> {
        let request = Request::builder()
            .uri(url)
            .header(ACCEPT, accept)
            .body(())
            .map_err(invalid_input_error)?;
        let response = self.client.request(request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::other(format!(
                "Error {} returned by {} with payload:\n{}",
                status,
                url,
                response.into_body().to_string()?
            )));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let mut content = Vec::new();
        response.into_body().read_to_end(&mut content)?;
        Ok((content_type, content))
    }
}

fn invalid_input_error(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Error {
    Error::new(ErrorKind::InvalidInput, error)
}
