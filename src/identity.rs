use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client_defaults::{DEFAULT_INTERFACE, SUBJECT_TOKEN_HEADER};
use crate::error::Error;
use crate::models::{AuthContext, EndpointList, PasswordAuthRequest, ServiceList, TokenResponse};

/// Closed set of HTTP operations a test case may name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Get,
}

pub struct IdentityClientBuilder {
    base_url: Url,
    auth: AuthContext,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl IdentityClientBuilder {
    /// Certificate verification starts out disabled; these clients usually
    /// talk to lab deployments with self-signed certificates.
    pub fn new(auth: AuthContext) -> Result<Self, Error> {
        Ok(Self {
            base_url: Url::parse(&auth.auth_url)?,
            auth,
            timeout: None,
            accept_invalid_certs: true,
        })
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<IdentityClient, Error> {
        let mut builder =
            HttpClient::builder().danger_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(IdentityClient {
            base_url: self.base_url,
            http,
            auth: self.auth,
            token: None,
            tenant_id: None,
        })
    }
}

/// Client for the identity service and its catalog. Caches the token and
/// scoped project id after the first fetch; neither is ever refreshed.
pub struct IdentityClient {
    base_url: Url,
    http: HttpClient,
    auth: AuthContext,
    token: Option<String>,
    tenant_id: Option<String>,
}

impl IdentityClient {
    pub fn builder(auth: AuthContext) -> Result<IdentityClientBuilder, Error> {
        IdentityClientBuilder::new(auth)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    fn build_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path_segments = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidBaseUrl(self.base_url.to_string()))?;
            path_segments.pop_if_empty();
            for segment in segments {
                path_segments.push(segment);
            }
        }
        Ok(url)
    }

    /// POST `/auth/tokens` and cache the subject token and project id.
    ///
    /// A response without the subject-token header yields `Ok(None)`; later
    /// calls then go out unauthenticated and the server turns them away. A
    /// body that does not decode is fatal to the whole run.
    pub fn get_token(&mut self) -> Result<Option<String>, Error> {
        info!("requesting identity token");
        let url = self.build_url(&["auth", "tokens"])?;
        let body = PasswordAuthRequest::new(&self.auth);
        let resp = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()?;
        let token = resp
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let parsed: TokenResponse = serde_json::from_str(&resp.text()?)?;
        debug!("token scoped to project {}", parsed.token.project.id);
        self.tenant_id = Some(parsed.token.project.id);
        self.token = token.clone();
        Ok(token)
    }

    /// Resolve a service's public endpoint URL.
    pub fn resolve_endpoint(&mut self, service_type: &str) -> Result<Option<String>, Error> {
        self.resolve_endpoint_on(service_type, DEFAULT_INTERFACE)
    }

    /// Two sequential catalog queries, each taking the first entry in list
    /// order. An empty or missing list is "not found", not an error.
    pub fn resolve_endpoint_on(
        &mut self,
        service_type: &str,
        interface: &str,
    ) -> Result<Option<String>, Error> {
        if self.token.is_none() {
            self.get_token()?;
        }
        let headers = auth_headers(self.token.as_deref().unwrap_or_default())?;

        let url = self.build_url(&["services"])?;
        let resp = self
            .http
            .get(url)
            .query(&[("type", service_type)])
            .headers(headers.clone())
            .send()?;
        let services: ServiceList = serde_json::from_str(&resp.text()?)?;
        let Some(service) = services.services.first() else {
            debug!("no {service_type} service in the catalog");
            return Ok(None);
        };

        let url = self.build_url(&["endpoints"])?;
        let resp = self
            .http
            .get(url)
            .query(&[("service_id", service.id.as_str()), ("interface", interface)])
            .headers(headers)
            .send()?;
        let endpoints: EndpointList = serde_json::from_str(&resp.text()?)?;
        Ok(endpoints.endpoints.first().map(|entry| entry.url.clone()))
    }

    /// Issue one operation call, timing just the dispatch itself.
    pub fn perform(
        &self,
        operation: Operation,
        url: &str,
        headers: HeaderMap,
        body: Option<&serde_json::Value>,
    ) -> Result<(Response, Duration), Error> {
        let mut req = match operation {
            Operation::Get => self.http.get(url),
        };
        req = req.headers(headers);
        if let Some(body) = body {
            req = req.json(body);
        }
        let start = Instant::now();
        let resp = req.send()?;
        let elapsed = start.elapsed();
        Ok((resp, elapsed))
    }
}

/// Default headers every catalog and operation call carries. An empty token
/// leaves the auth header off entirely.
pub(crate) fn auth_headers(token: &str) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if !token.is_empty() {
        let value = HeaderValue::from_str(token)
            .map_err(|_| Error::InvalidHeader("X-Auth-Token".to_string()))?;
        headers.insert("X-Auth-Token", value);
    }
    Ok(headers)
}
