use std::time::Duration;

use flexstr::SharedStr as FlexStr;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use thiserror::Error;

use crate::web::config::Config;

// The three client-observable failure kinds.  Precondition failures never
// reach this type: they are blocked before a request is built.
#[derive(Error, Debug)]
pub enum ApiError {
    // no response received at all
    #[error("network error: {0}")]
    Transport(reqwest::Error),
    // non-2xx with a JSON {message} body; the message is shown verbatim
    #[error("{message}")]
    Server { status: u16, message: String },
    // 2xx body that doesn't deserialize into the expected shape
    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> ApiError {
        ApiError::Transport(err)
    }
}

// minimal envelope used by every mutating endpoint
#[derive(Deserialize, Debug)]
pub struct ApiStatus {
    pub success: bool,
    #[serde(default)]
    pub message: Option<FlexStr>,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    admin_base: String,
    public_base: String,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &Config) -> ApiClient {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_seconds))
            .build()
            .unwrap_or_else(|err| panic!("failed to build HTTP client: {}", err));

        ApiClient {
            http,
            admin_base: config.api.admin_base_url.trim_end_matches('/').to_owned(),
            public_base: config.api.public_base_url.trim_end_matches('/').to_owned(),
            upload_timeout: Duration::from_secs(config.api.upload_timeout_seconds),
        }
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("{}{}", self.admin_base, path)
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base, path)
    }

    async fn read_response<T: DeserializeOwned>(&self, response: reqwest::Response)
        -> Result<T, ApiError>
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message =
                match serde_json::from_slice::<ErrorBody>(&body) {
                    Ok(ErrorBody { message: Some(message) }) => message,
                    _ => {
                        if let Some(reason) = status.canonical_reason() {
                            format!("request failed: {} - {}", status.as_u16(), reason)
                        } else {
                            format!("request failed with status code: {}", status.as_u16())
                        }
                    },
                };
            return Err(ApiError::Server { status: status.as_u16(), message });
        }

        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.http.get(url).send().await?;
        self.read_response(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B)
        -> Result<T, ApiError>
    {
        let response = self.http.post(url).json(body).send().await?;
        self.read_response(response).await
    }

    // POST with an empty body, for action endpoints like reset_db
    pub async fn post_empty<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.http.post(url).send().await?;
        self.read_response(response).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B)
        -> Result<T, ApiError>
    {
        let response = self.http.put(url).json(body).send().await?;
        self.read_response(response).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.http.delete(url).send().await?;
        self.read_response(response).await
    }

    // file uploads get the long timeout instead of the per-request default
    pub async fn post_multipart<T: DeserializeOwned>(&self, url: &str,
                                                     form: reqwest::multipart::Form)
        -> Result<T, ApiError>
    {
        let response = self.http.post(url)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send().await?;
        self.read_response(response).await
    }
}

pub fn file_part(file_name: &str, payload: bytes::Bytes) -> reqwest::multipart::Part {
    let mime_type = mime_guess::from_path(file_name)
        .first_or_octet_stream();

    reqwest::multipart::Part::stream(reqwest::Body::from(payload))
        .file_name(file_name.to_owned())
        .mime_str(mime_type.essence_str())
        .unwrap_or_else(|err| panic!("invalid mime type for {}: {}", file_name, err))
}
