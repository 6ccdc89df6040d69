use std::{fmt::Debug, time::Duration};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::serde::{SerdePathError, SerdeResponseParse};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

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

#[derive(Debug)]
#[allow(dead_code)]
pub struct ReqwestErrorContext {
    pub url: Url,
    query: String,
}

#[derive(Debug)]
pub enum ReqwestInnerError {
    Reqwest(reqwest::Error),
    SerdePath(SerdePathError),
}

impl ReqwestInnerError {
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Reqwest(err) => err.is_connect() || err.is_timeout(),
            Self::SerdePath(_) => false,
        }
    }
}

/// GET request builder that keeps enough context to explain a failure.
pub struct Reqwest {
    builder: RequestBuilder,
    error_context: Option<ReqwestErrorContext>,
}

impl Reqwest {
    pub fn get<U: ToString>(client: &Client, url: U) -> crate::Result<Self> {
        let url = parse_url(url)?;
        let builder = client.get(url.clone()).timeout(DEFAULT_TIMEOUT);
        Ok(Self {
            builder,
            error_context: Some(ReqwestErrorContext {
                url,
                query: String::new(),
            }),
        })
    }

    /// Adds query parameters. Values whose key contains `apikey` are redacted
    /// from the error context.
    pub fn query(mut self, query: &[(&str, String)]) -> Self {
        self.builder = self.builder.query(query);
        if let Some(context) = self.error_context.as_mut() {
            let redacted = query
                .iter()
                .map(|(key, value)| {
                    if key.contains("apikey") {
                        format!("{key}=***")
                    } else {
                        format!("{key}={value}")
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            if !context.query.is_empty() {
                context.query.push('&');
            }
            context.query.push_str(&redacted);
        }
        self
    }

    async fn receive_text_internal(mut self) -> crate::Result<(String, Box<ReqwestErrorContext>)> {
        let error_context = Box::new(
            self.error_context
                .take()
                .ok_or(crate::Error::ReqwestErrorContextMissing)?,
        );

        let send_result = self.builder.send().await;
        let response = match send_result {
            Ok(response) => response,
            Err(err) if err.is_connect() => {
                return Err(crate::Error::Internet(error_context.url));
            }
            Err(err) => {
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Send,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err),
                });
            }
        };

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Status,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err),
                });
            }
        };

        match response.text().await {
            Ok(text) => Ok((text, error_context)),
            Err(err) => Err(crate::Error::ReqwestFailed {
                stage: ReqwestStage::DecodeText,
                context: error_context,
                inner: ReqwestInnerError::Reqwest(err),
            }),
        }
    }

    pub async fn receive_json<J: Debug + DeserializeOwned>(self) -> crate::Result<J> {
        let (text, error_context) = self.receive_text_internal().await?;

        text.as_str()
            .serde_parse_custom()
            .map_err(|err| crate::Error::ReqwestFailed {
                stage: ReqwestStage::Deserialise,
                context: error_context,
                inner: ReqwestInnerError::SerdePath(err),
            })
    }
}
