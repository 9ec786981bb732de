use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// 验证结果；服务不可用时由调用方决定放行或拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid,
    Invalid,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptchaPolicy {
    #[default]
    FailOpen,
    FailClosed,
}

impl CaptchaPolicy {
    pub fn admits(self, outcome: VerifyOutcome) -> bool {
        match outcome {
            VerifyOutcome::Valid => true,
            VerifyOutcome::Invalid => false,
            VerifyOutcome::Unavailable => self == CaptchaPolicy::FailOpen,
        }
    }
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> VerifyOutcome;
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Cloudflare Turnstile 校验
#[derive(Clone)]
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: Option<String>,
    endpoint: String,
}

impl TurnstileVerifier {
    pub fn new(secret: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_endpoint(secret, timeout, SITEVERIFY_URL)
    }

    pub fn with_endpoint(
        secret: Option<String>,
        timeout: Duration,
        endpoint: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            secret,
            endpoint: endpoint.into(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> VerifyOutcome {
        let Some(secret) = &self.secret else {
            tracing::debug!("Turnstile secret not configured");
            return VerifyOutcome::Unavailable;
        };
        if token.trim().is_empty() {
            return VerifyOutcome::Invalid;
        }

        let mut form = vec![("secret", secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = match self.client.post(&self.endpoint).form(&form).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Turnstile request failed: {}", e);
                return VerifyOutcome::Unavailable;
            }
        };
        if !response.status().is_success() {
            tracing::warn!("Turnstile returned status {}", response.status());
            return VerifyOutcome::Unavailable;
        }

        match response.json::<SiteverifyResponse>().await {
            Ok(body) if body.success => VerifyOutcome::Valid,
            Ok(body) => {
                tracing::debug!("Turnstile rejected token: {:?}", body.error_codes);
                VerifyOutcome::Invalid
            }
            Err(e) => {
                tracing::warn!("Failed to decode Turnstile response: {}", e);
                VerifyOutcome::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_open_admits_unavailable() {
        assert!(CaptchaPolicy::FailOpen.admits(VerifyOutcome::Unavailable));
        assert!(CaptchaPolicy::FailOpen.admits(VerifyOutcome::Valid));
        assert!(!CaptchaPolicy::FailOpen.admits(VerifyOutcome::Invalid));
    }

    #[test]
    fn fail_closed_rejects_unavailable() {
        assert!(!CaptchaPolicy::FailClosed.admits(VerifyOutcome::Unavailable));
        assert!(CaptchaPolicy::FailClosed.admits(VerifyOutcome::Valid));
        assert!(!CaptchaPolicy::FailClosed.admits(VerifyOutcome::Invalid));
    }

    #[tokio::test]
    async fn missing_secret_is_unavailable() {
        let verifier = TurnstileVerifier::new(None, Duration::from_secs(1)).unwrap();
        assert!(!verifier.is_enabled());
        assert_eq!(
            verifier.verify("token", None).await,
            VerifyOutcome::Unavailable
        );
    }

    #[tokio::test]
    async fn empty_token_is_invalid_without_network() {
        let verifier = TurnstileVerifier::with_endpoint(
            Some("secret".into()),
            Duration::from_secs(1),
            "http://127.0.0.1:9/unused",
        )
        .unwrap();
        assert_eq!(verifier.verify("  ", None).await, VerifyOutcome::Invalid);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let verifier = TurnstileVerifier::with_endpoint(
            Some("secret".into()),
            Duration::from_millis(500),
            "http://127.0.0.1:9/siteverify",
        )
        .unwrap();
        assert_eq!(
            verifier.verify("token", Some("203.0.113.7")).await,
            VerifyOutcome::Unavailable
        );
    }
}
