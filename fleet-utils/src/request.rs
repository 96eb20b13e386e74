#[cfg(all(feature = "request", feature = "request-js"))]
compile_error!("features `request` and `request-js` are mutually exclusive");

use anyhow::{anyhow, Result};
use thiserror::Error;

/// Why a request did not produce a usable body.
///
/// Attached to the `anyhow::Error` returned by [`post`] so callers can tell an
/// unreachable service apart from one that answered with an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    /// The request never produced a response (connection refused, DNS, CORS).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The service answered outside of 2xx.
    #[error("Request error (status: {status}, body: {body})")]
    Status { status: u16, body: String },
    /// A response arrived but its body could not be read.
    #[error("Body error: {0}")]
    Body(String),
}

/// Finds the [`RequestError`] behind an error returned by this module, if any.
pub fn request_error(err: &anyhow::Error) -> Option<&RequestError> {
    err.downcast_ref::<RequestError>()
}

pub fn json_headers() -> Vec<(String, String)> {
    vec![
        ("content-type".to_string(), "application/json".to_string()),
        ("accept".to_string(), "application/json".to_string()),
    ]
}

#[cfg(feature = "request-js")]
mod request {
    use super::*;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

    #[allow(async_fn_in_trait)]
    pub trait FromResponse: Sized {
        async fn from_response(response: Response) -> Result<Self>;
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if !(200..=299).contains(&status) {
            let body = match response.text() {
                Ok(promise) => match JsFuture::from(promise).await {
                    Ok(value) => value.as_string().unwrap_or_default(),
                    Err(_) => String::new(),
                },
                Err(_) => String::new(),
            };
            return Err(RequestError::Status { status, body }.into());
        }
        Ok(response)
    }

    impl FromResponse for String {
        async fn from_response(response: Response) -> Result<Self> {
            let promise = check_status(response)
                .await?
                .text()
                .map_err(|_| RequestError::Body("Failed to read response body as text".into()))?;
            JsFuture::from(promise)
                .await
                .map_err(|_| RequestError::Body("Failed to read response body as text".into()))?
                .as_string()
                .ok_or_else(|| RequestError::Body("Failed to convert JsValue to String".into()).into())
        }
    }

    async fn call<T>(
        method: &str,
        url: &str,
        body: Option<&JsValue>,
        headers: Option<Headers>,
    ) -> Result<T>
    where
        T: FromResponse,
    {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);

        if let Some(b) = body {
            opts.set_body(b);
        }

        if let Some(h) = headers {
            opts.set_headers(&h);
        }

        let request = Request::new_with_str_and_init(url, &opts)
            .map_err(|_| anyhow!("Failed to create request"))?;

        let window = web_sys::window().ok_or_else(|| anyhow!("No global `window` exists"))?;
        let response_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| RequestError::Transport(format!("Failed to fetch {}: {:?}", url, e)))?;

        let response: Response = response_value
            .dyn_into()
            .map_err(|_| anyhow!("Failed to cast to Response"))?;

        T::from_response(response).await
    }

    pub async fn post<T>(url: &str, body: &str, headers: Option<Vec<(String, String)>>) -> Result<T>
    where
        T: FromResponse,
    {
        let headers = convert_headers(headers)?;
        let body_value = Some(JsValue::from_str(body));
        call::<T>("POST", url, body_value.as_ref(), headers).await
    }

    fn convert_headers(headers_option: Option<Vec<(String, String)>>) -> Result<Option<Headers>> {
        headers_option
            .map(|headers_map| {
                let headers = Headers::new().map_err(|_| anyhow!("Failed to create Headers"))?;
                for (key, value) in headers_map {
                    headers
                        .set(&key, &value)
                        .map_err(|_| anyhow!("Failed to set header {}", key))?;
                }
                Ok(headers)
            })
            .transpose()
    }
}

#[cfg(feature = "request")]
mod request {
    use super::*;
    use reqwest::{
        header::{HeaderMap, HeaderName, HeaderValue},
        Method, Response,
    };

    #[allow(async_fn_in_trait)]
    pub trait FromResponse: Sized {
        async fn from_response(response: Response) -> Result<Self>;
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status().as_u16();
        if !(200..=299).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Status { status, body }.into());
        }
        Ok(response)
    }

    impl FromResponse for String {
        async fn from_response(response: Response) -> Result<Self> {
            check_status(response)
                .await?
                .text()
                .await
                .map_err(|e| RequestError::Body(e.to_string()).into())
        }
    }

    async fn call<T: FromResponse>(
        method: &str,
        url: &str,
        body: Option<String>,
        headers: Option<HeaderMap>,
    ) -> Result<T> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| anyhow!("Invalid method {}", method))?;
        let client = reqwest::Client::new();
        let mut request_builder = client.request(method, url);

        if let Some(b) = body {
            request_builder = request_builder.body(b);
        }

        if let Some(h) = headers {
            request_builder = request_builder.headers(h);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| RequestError::Transport(e.to_string()))?;
        T::from_response(response).await
    }

    pub async fn post<T: FromResponse>(
        url: &str,
        body: &str,
        headers: Option<Vec<(String, String)>>,
    ) -> Result<T> {
        let headers = convert_headers(headers)?;
        let body_value = Some(body.to_string());
        call::<T>("POST", url, body_value, headers).await
    }

    fn convert_headers(headers_option: Option<Vec<(String, String)>>) -> Result<Option<HeaderMap>> {
        headers_option
            .map(|headers_map| {
                let mut headers = HeaderMap::new();
                for (key, value) in headers_map {
                    let header_name = HeaderName::from_bytes(key.as_bytes())
                        .map_err(|_| anyhow!("Invalid header name {}", key))?;
                    let header_value = HeaderValue::from_str(&value)
                        .map_err(|_| anyhow!("Invalid header value for {}", key))?;
                    headers.insert(header_name, header_value);
                }
                Ok(headers)
            })
            .transpose()
    }
}

pub use request::*;
