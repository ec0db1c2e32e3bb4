use http::{StatusCode, header::CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::error::Result;

/// Builds the HTTP client shared by every service.
pub fn build_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("hosped/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Attaches `payload` as a JSON body.
pub fn with_json<T: Serialize>(req: RequestBuilder, payload: &T) -> Result<RequestBuilder> {
    let body = sonic_rs::to_string(payload)?;
    Ok(req.header(CONTENT_TYPE, "application/json").body(body))
}

/// Drains a response into its status and text body.
pub async fn read_body(resp: Response) -> Result<(StatusCode, String)> {
    let status = resp.status();
    let text = resp.text().await?;
    Ok((status, text))
}

/// Parses a JSON body.
pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(sonic_rs::from_str(body)?)
}
