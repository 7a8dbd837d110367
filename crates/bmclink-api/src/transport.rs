// Shared HTTP transport for every BMC connection.
//
// One `Transport` per client. It owns two lazily built `reqwest::Client`
// pools (with and without Basic auth), applies the retry policy from the
// connection descriptor, and classifies failures into `Error` variants so
// adapters never see raw `reqwest` errors for the common cases.

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::descriptor::{ConnectionDescriptor, TlsMode};
use crate::error::{is_retryable_status, ConnectionKind, Error};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeouts and identity shared by both connection pools.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request deadline unless overridden per request.
    pub timeout: Duration,
    /// TCP + TLS establishment deadline.
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("bmclink/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` for the given TLS mode.
    fn build_client(&self, tls: &TlsMode) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers);

        match tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Request / response ──────────────────────────────────────────────

/// Per-request knobs. Defaults: no body, authenticated, transport timeout.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub body: Option<Bytes>,
    pub headers: HeaderMap,
    pub auth: bool,
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            body: None,
            headers: HeaderMap::new(),
            auth: true,
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` as the JSON request body.
    pub fn json(mut self, value: &impl Serialize) -> Result<Self, Error> {
        let body = serde_json::to_vec(value).map_err(|e| Error::Deserialization {
            message: format!("failed to encode request body: {e}"),
            body: String::new(),
        })?;
        self.body = Some(Bytes::from(body));
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send without credentials, over the unauthenticated pool.
    pub fn unauthenticated(mut self) -> Self {
        self.auth = false;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    async fn read(resp: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Location` header, used by BMCs to hand back task monitors.
    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize the body, keeping it in the error for debugging.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: self.text().into_owned(),
        })
    }

    /// Turn a non-2xx response into [`Error::Status`].
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status,
                body: self.text().into_owned(),
            })
        }
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// Authenticated HTTP execution against one BMC.
///
/// The two pools are independent: an unauthenticated probe never carries
/// credentials and is unaffected by whatever happens on the authenticated
/// pool. Both are rebuilt on demand after [`reset`](Self::reset).
pub struct Transport {
    descriptor: ConnectionDescriptor,
    config: TransportConfig,
    base_url: Url,
    authenticated: OnceCell<reqwest::Client>,
    anonymous: OnceCell<reqwest::Client>,
}

impl Transport {
    pub fn new(descriptor: ConnectionDescriptor) -> Result<Self, Error> {
        Self::with_config(descriptor, TransportConfig::default())
    }

    pub fn with_config(
        descriptor: ConnectionDescriptor,
        config: TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = descriptor.base_url()?;
        Ok(Self {
            descriptor,
            config,
            base_url,
            authenticated: OnceCell::new(),
            anonymous: OnceCell::new(),
        })
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn host(&self) -> &str {
        &self.descriptor.host
    }

    /// Drop both cached pools. The next request builds fresh ones.
    pub fn reset(&mut self) {
        self.authenticated = OnceCell::new();
        self.anonymous = OnceCell::new();
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Verb helpers ─────────────────────────────────────────────────

    pub async fn get(&self, path: &str) -> Result<Response, Error> {
        self.request(Method::GET, path, RequestOptions::default())
            .await
    }

    pub async fn post(&self, path: &str, body: &impl Serialize) -> Result<Response, Error> {
        self.request(Method::POST, path, RequestOptions::new().json(body)?)
            .await
    }

    pub async fn put(&self, path: &str, body: &impl Serialize) -> Result<Response, Error> {
        self.request(Method::PUT, path, RequestOptions::new().json(body)?)
            .await
    }

    pub async fn patch(&self, path: &str, body: &impl Serialize) -> Result<Response, Error> {
        self.request(Method::PATCH, path, RequestOptions::new().json(body)?)
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, Error> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }

    /// GET `path` and decode a 2xx JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get(path).await?.error_for_status()?.json()
    }

    /// The Redfish service root document.
    pub async fn service_root(&self) -> Result<serde_json::Value, Error> {
        self.get_json("/redfish/v1").await
    }

    /// `RedfishVersion` from the service root, if the BMC reports one.
    pub async fn redfish_version(&self) -> Result<Option<String>, Error> {
        let root = self.service_root().await?;
        Ok(root
            .get("RedfishVersion")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned))
    }

    // ── Core request loop ────────────────────────────────────────────

    /// Execute a request with the descriptor's retry policy.
    ///
    /// Connection failures, timeouts and statuses 408/429/500/502/503/504
    /// are retried for every method. Other statuses come back as a normal
    /// [`Response`]. Once the budget is spent the last failure is returned
    /// inside [`Error::RetriesExhausted`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, Error> {
        let url = self.url(path)?;
        let policy = self.descriptor.retry;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let failure = match self.send_once(&method, &url, &options).await {
                Ok(resp) if is_retryable_status(resp.status()) => Error::Status {
                    status: resp.status(),
                    body: resp.text().into_owned(),
                },
                Ok(resp) => return Ok(resp),
                Err(err) => err,
            };

            if !failure.is_transient() {
                return Err(failure);
            }

            if attempt > policy.max_retries {
                warn!(
                    %method,
                    %url,
                    attempts = attempt,
                    reason = %failure,
                    "retry budget exhausted"
                );
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(failure),
                });
            }

            let delay = policy.delay(attempt);
            warn!(
                %method,
                %url,
                attempt,
                max_retries = policy.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason = %failure,
                "retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        let client = self.client(options.auth).await?;
        let timeout = options.timeout.unwrap_or(self.config.timeout);

        let mut req = client
            .request(method.clone(), url.clone())
            .headers(options.headers.clone())
            .timeout(timeout);

        if options.auth && !self.descriptor.username.is_empty() {
            req = req.basic_auth(
                &self.descriptor.username,
                Some(self.descriptor.password.expose_secret()),
            );
        }
        if let Some(ref host) = self.descriptor.host_header {
            req = req.header(header::HOST, host);
        }
        if let Some(ref body) = options.body {
            req = req.body(body.clone());
        }

        debug!(%method, %url, auth = options.auth, "sending request");

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return Err(self.classify(e, timeout).await),
        };
        debug!(%method, %url, status = resp.status().as_u16(), "response received");

        match Response::read(resp).await {
            Ok(resp) => Ok(resp),
            Err(e) => Err(self.classify(e, timeout).await),
        }
    }

    async fn client(&self, auth: bool) -> Result<&reqwest::Client, Error> {
        let cell = if auth {
            &self.authenticated
        } else {
            &self.anonymous
        };
        cell.get_or_try_init(|| async { self.config.build_client(&self.descriptor.tls) })
            .await
    }

    /// Map a `reqwest` failure onto the error taxonomy.
    ///
    /// Connect failures on a TLS connection get a raw TCP probe to tell a
    /// dead host from a broken handshake or a plain-HTTP listener. The
    /// probe only informs the error; the request is never retried in clear.
    async fn classify(&self, err: reqwest::Error, timeout: Duration) -> Error {
        let host = self.descriptor.host.clone();

        if err.is_timeout() {
            debug!(%host, "request timed out");
            return Error::Timeout {
                host,
                timeout_secs: timeout.as_secs(),
            };
        }

        if err.is_connect() {
            let kind = if self.descriptor.use_tls {
                diagnose_connect_failure(&self.descriptor.host, self.descriptor.port).await
            } else {
                ConnectionKind::Unreachable
            };
            debug!(%host, %kind, "connection failed");
            return Error::Connection {
                host,
                reason: error_chain(&err),
                kind,
            };
        }

        Error::Transport(err)
    }
}

/// Best-effort look at what is listening on `host:port` after a failed
/// TLS connect.
async fn diagnose_connect_failure(host: &str, port: u16) -> ConnectionKind {
    let Ok(Ok(mut stream)) =
        tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await
    else {
        return ConnectionKind::Unreachable;
    };

    let request = format!("HEAD / HTTP/1.0\r\nHost: {host}\r\n\r\n");
    let mut prefix = [0_u8; 5];
    let answered = tokio::time::timeout(PROBE_TIMEOUT, async {
        stream.write_all(request.as_bytes()).await?;
        stream.read_exact(&mut prefix).await?;
        Ok::<_, std::io::Error>(())
    })
    .await;

    if matches!(answered, Ok(Ok(()))) && &prefix == b"HTTP/" {
        ConnectionKind::PlaintextOnTlsPort
    } else {
        ConnectionKind::TlsHandshake
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
