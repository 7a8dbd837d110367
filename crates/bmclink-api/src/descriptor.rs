// ── Connection descriptor ──
//
// Everything needed to reach one BMC: address, TLS policy, credentials
// and retry budget. Built once by the caller and never mutated afterwards;
// the transport and every adapter read from their own copy.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// TLS certificate verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate. BMCs ship self-signed certificates, so this
    /// is the default.
    #[default]
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Whether server certificates are checked at all.
    pub fn verifies(&self) -> bool {
        !matches!(self, Self::DangerAcceptInvalid)
    }
}

/// Retry budget and backoff shape for transient failures.
///
/// The wait before retry `n` (1-based) is `base_delay * floor(n^1.5)`
/// plus up to `jitter` of that interval at random.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `3` means at most four requests.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Fraction of the interval added at random, in `0.0..=1.0`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// The deterministic part of the wait before retry `attempt`.
    pub fn interval(&self, attempt: u32) -> Duration {
        let factor = f64::from(attempt).powf(1.5).floor();
        self.base_delay.mul_f64(factor)
    }

    /// Interval plus random jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let interval = self.interval(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0) * rand::random::<f64>();
        interval + interval.mul_f64(jitter)
    }
}

/// How to reach and authenticate against a single BMC.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub tls: TlsMode,
    pub username: String,
    pub password: SecretString,
    /// Sent as the `Host` header instead of `host:port` (BMCs behind a
    /// port-forward or reverse proxy).
    pub host_header: Option<String>,
    pub retry: RetryPolicy,
}

impl ConnectionDescriptor {
    /// HTTPS on 443, certificates not verified, default retry policy.
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            port: 443,
            use_tls: true,
            tls: TlsMode::default(),
            username: username.into(),
            password,
            host_header: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_tls_mode(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Shorthand for toggling between [`TlsMode::System`] and
    /// [`TlsMode::DangerAcceptInvalid`].
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.tls = if verify {
            TlsMode::System
        } else {
            TlsMode::DangerAcceptInvalid
        };
        self
    }

    pub fn with_host_header(mut self, host_header: impl Into<String>) -> Self {
        self.host_header = Some(host_header.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn verify_tls(&self) -> bool {
        self.tls.verifies()
    }

    /// `scheme://host:port`, with IPv6 literals bracketed.
    pub fn base_url(&self) -> Result<Url, Error> {
        let scheme = if self.use_tls { "https" } else { "http" };
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        Ok(Url::parse(&format!("{scheme}://{host}:{}", self.port))?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn descriptor(host: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::new(host, "root", SecretString::from("calvin"))
    }

    #[test]
    fn base_url_defaults_to_https_443() {
        let url = descriptor("10.0.0.5").base_url().unwrap();
        // The url crate drops the scheme's default port.
        assert_eq!(url.as_str(), "https://10.0.0.5/");
    }

    #[test]
    fn base_url_plain_http_custom_port() {
        let url = descriptor("bmc.lab")
            .with_tls(false)
            .with_port(8080)
            .base_url()
            .unwrap();
        assert_eq!(url.as_str(), "http://bmc.lab:8080/");
    }

    #[test]
    fn base_url_brackets_ipv6() {
        let url = descriptor("fe80::1").with_port(8443).base_url().unwrap();
        assert_eq!(url.host_str(), Some("[fe80::1]"));
        assert_eq!(url.port(), Some(8443));
    }

    #[test]
    fn verify_flag_maps_to_tls_mode() {
        let d = descriptor("bmc");
        assert!(!d.verify_tls());
        let d = d.with_verify_tls(true);
        assert_eq!(d.tls, TlsMode::System);
        assert!(d.verify_tls());
    }

    #[test]
    fn backoff_interval_grows_as_power_one_point_five() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.interval(1), Duration::from_secs(1));
        assert_eq!(policy.interval(2), Duration::from_secs(2));
        assert_eq!(policy.interval(3), Duration::from_secs(5));
        assert_eq!(policy.interval(4), Duration::from_secs(8));
    }

    #[test]
    fn jitter_stays_within_half_the_interval() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        for attempt in 1..=3 {
            let interval = policy.interval(attempt);
            for _ in 0..50 {
                let delay = policy.delay(attempt);
                assert!(delay >= interval);
                assert!(delay <= interval + interval / 2);
            }
        }
    }

    #[test]
    fn no_retry_policy_has_zero_delay() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.delay(1), Duration::ZERO);
    }
}
