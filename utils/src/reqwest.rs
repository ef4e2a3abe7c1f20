use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};
use tracing::debug;
use url::Url;

use crate::serde::{parse_with_path, SerdePathError};

const REDACTED: &str = "***";

#[derive(Debug)]
pub enum ReqwestStage {
    Send,
    Status,
    DecodeText,
    Deserialise,
}

fn parse_url<U: ToString>(url: U) -> crate::Result<Url> {
    url.to_string()
        .parse::<Url>()
        .map_err(|_| crate::Error::InvalidUrl(url.to_string()))
}

/// What we know about a request when it fails. Secrets are already masked.
#[derive(Debug)]
#[allow(dead_code)]
pub struct ReqwestErrorContext {
    pub url: String,
    query: String,
    json_body: String,
}

impl ReqwestErrorContext {
    fn redact(mut self, secrets: &[String]) -> Self {
        for secret in secrets.iter().filter(|s| !s.is_empty()) {
            self.url = self.url.replace(secret.as_str(), REDACTED);
            self.query = self.query.replace(secret.as_str(), REDACTED);
            self.json_body = self.json_body.replace(secret.as_str(), REDACTED);
        }
        self
    }
}

#[derive(Debug)]
pub enum ReqwestInnerError {
    Reqwest(reqwest::Error),
    SerdePath(SerdePathError),
}

impl ReqwestInnerError {
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Reqwest(err) => err.is_connect(),
            Self::SerdePath(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Reqwest(err) => err.is_timeout(),
            Self::SerdePath(_) => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Reqwest(err) => err.status(),
            Self::SerdePath(_) => None,
        }
    }
}

/// Thin wrapper over a reqwest builder that keeps enough context to report
/// which stage of a request failed, without leaking credentials.
pub struct Reqwest {
    builder: RequestBuilder,
    error_context: Option<ReqwestErrorContext>,
    secrets: Vec<String>,
}

impl Reqwest {
    fn new(url: Url, builder: RequestBuilder) -> Self {
        Self {
            builder,
            error_context: Some(ReqwestErrorContext {
                url: url.to_string(),
                query: String::new(),
                json_body: String::new(),
            }),
            secrets: Vec::new(),
        }
    }

    pub fn get<U: ToString>(url: U) -> crate::Result<Self> {
        let url = parse_url(url)?;
        let client = reqwest::Client::new();
        let builder = client.get(url.clone());
        Ok(Self::new(url, builder))
    }

    pub fn post<U: ToString>(url: U) -> crate::Result<Self> {
        let url = parse_url(url)?;
        let client = reqwest::Client::new();
        let builder = client.post(url.clone());
        Ok(Self::new(url, builder))
    }

    /// Marks a value that must never show up in error messages or logs.
    pub fn secret<S: ToString>(mut self, secret: S) -> Self {
        self.secrets.push(secret.to_string());
        self
    }

    pub fn query<T: serde::Serialize + Debug>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        if let Some(context) = self.error_context.as_mut() {
            context.query.push_str(&format!("{query:?}"));
        }
        self
    }

    pub fn json_body<T: serde::Serialize + Debug>(mut self, json_body: &T) -> Self {
        self.builder = self.builder.json(json_body);
        if let Some(context) = self.error_context.as_mut() {
            context.json_body = format!("{json_body:?}");
        }
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.builder = self.builder.basic_auth(username, Some(password));
        self.secret(password)
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.builder = self.builder.timeout(timeout);
        }
        self
    }

    async fn receive_text(mut self) -> crate::Result<(String, Box<ReqwestErrorContext>)> {
        let error_context = Box::new(
            self.error_context
                .take()
                .ok_or(crate::Error::ReqwestErrorContextMissing)?
                .redact(&self.secrets),
        );

        debug!(url = %error_context.url, "sending request");

        let send_result = self.builder.send().await;
        let Ok(response) = send_result else {
            let err = send_result.unwrap_err();
            if err.is_connect() {
                return Err(crate::Error::Internet(error_context.url));
            } else {
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Send,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err.without_url()),
                });
            }
        };

        let status_result = response.error_for_status();
        let Ok(response) = status_result else {
            let err = status_result.unwrap_err();
            return Err(crate::Error::ReqwestFailed {
                stage: ReqwestStage::Status,
                context: error_context,
                inner: ReqwestInnerError::Reqwest(err.without_url()),
            });
        };

        let text_result = response.text().await;
        let Ok(text) = text_result else {
            let err = text_result.unwrap_err();
            return Err(crate::Error::ReqwestFailed {
                stage: ReqwestStage::DecodeText,
                context: error_context,
                inner: ReqwestInnerError::Reqwest(err.without_url()),
            });
        };

        Ok((text, error_context))
    }

    pub async fn receive_json<J: Debug + DeserializeOwned>(self) -> crate::Result<J> {
        let (text, error_context) = self.receive_text().await?;

        let parse_result = parse_with_path(&text);
        let Ok(json) = parse_result else {
            let err = parse_result.unwrap_err();
            return Err(crate::Error::ReqwestFailed {
                stage: ReqwestStage::Deserialise,
                context: error_context,
                inner: ReqwestInnerError::SerdePath(err),
            });
        };
        Ok(json)
    }
}
