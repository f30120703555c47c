use anyhow::{Context, Result};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Error, Request, Response, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use std::convert::TryInto;

pub type HttpParams = Vec<(String, String)>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RestRequestOutcome {
    pub status: StatusCode,
    pub content: String,
}

impl RestRequestOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub struct RestClient {
    client: Client<HttpsConnector<HttpConnector>>,
}

const APPLICATION_JSON: &str = "application/json";

impl RestClient {
    pub fn new() -> Self {
        Self {
            client: create_client(),
        }
    }

    pub async fn get(&self, url: Uri) -> Result<RestRequestOutcome> {
        let req = Request::get(url)
            .header(hyper::header::ACCEPT, APPLICATION_JSON)
            .body(Body::empty())
            .context("Error during creation of http GET request")?;

        let response = self.client.request(req).await;

        handle_response(response, "GET").await
    }
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

fn create_client() -> Client<HttpsConnector<HttpConnector>> {
    let https = HttpsConnector::new();
    Client::builder().build::<_, Body>(https)
}

// Inner Hyper types. Needed just for unified response handling in handle_response()
type ResponseType = std::result::Result<Response<Body>, Error>;
async fn handle_response(response: ResponseType, rest_action: &str) -> Result<RestRequestOutcome> {
    let response = response.with_context(|| format!("Unable to send {} request", rest_action))?;

    Ok(RestRequestOutcome {
        status: response.status(),
        content: std::str::from_utf8(hyper::body::to_bytes(response.into_body()).await?.as_ref())
            .context("Unable to parse content string")?
            .to_owned(),
    })
}

pub fn build_uri(host: &str, path: &str, http_params: &HttpParams) -> Result<Uri> {
    let mut url = String::with_capacity(256);
    url.push_str(host.trim_end_matches('/'));
    if !path.is_empty() && !path.starts_with('/') {
        url.push('/');
    }
    url.push_str(path);

    if !http_params.is_empty() {
        url.push('?');
    }

    let mut is_first = true;
    for (k, v) in http_params {
        if !is_first {
            url.push('&')
        }
        url.push_str(k);
        url.push('=');
        url.push_str(v);

        is_first = false;
    }

    url.try_into().context("Unable create url")
}
