//! Request authentication for the control plane.
//!
//! The control plane speaks HTTP digest: the first attempt of a call
//! comes back 401 with a challenge, the client answers it, and the
//! request is retried once with the computed `Authorization` header.
//! Every call performs its own handshake with a fresh client nonce, so
//! the client carries no auth state between requests. Schemes are
//! injected at construction; preemptive basic auth is available for
//! proxied deployments and tests.

use std::fmt;
use std::fmt::Write as _;

use md5::Md5;
use sha2::{Digest as _, Sha256};
use ulid::Ulid;

use crate::error::{Error, Result};

/// Nonce count sent on every authorized attempt. Always 1 because each
/// call performs its own handshake.
const NONCE_COUNT: &str = "00000001";

/// Client identity presented to the control plane.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    api_key: String,
}

impl Credentials {
    /// Create credentials from an API user and key.
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    /// The API user name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Strategy producing per-request auth material.
///
/// `prepare` runs on every outgoing request. `answer_challenge` runs at
/// most once per call, when the first attempt came back 401 with a
/// `WWW-Authenticate` header.
pub trait AuthScheme: fmt::Debug + Send + Sync {
    /// Attach preemptive auth material to an outgoing request.
    fn prepare(
        &self,
        request: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder;

    /// Answer a 401 challenge with an `Authorization` header value, or
    /// `None` when the scheme has no second attempt to make.
    fn answer_challenge(
        &self,
        challenge: &str,
        method: &str,
        uri: &str,
        credentials: &Credentials,
    ) -> Result<Option<String>>;
}

/// Challenge-response digest auth, the control plane's native scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestAuth;

impl AuthScheme for DigestAuth {
    fn prepare(
        &self,
        request: reqwest::RequestBuilder,
        _credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        request
    }

    fn answer_challenge(
        &self,
        challenge: &str,
        method: &str,
        uri: &str,
        credentials: &Credentials,
    ) -> Result<Option<String>> {
        let challenge = DigestChallenge::parse(challenge)?;
        let cnonce = Ulid::new().to_string().to_lowercase();
        authorization_header(&challenge, credentials, method, uri, &cnonce).map(Some)
    }
}

/// Preemptive basic auth.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuth;

impl AuthScheme for BasicAuth {
    fn prepare(
        &self,
        request: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        request.basic_auth(credentials.username(), Some(credentials.api_key()))
    }

    fn answer_challenge(
        &self,
        _challenge: &str,
        _method: &str,
        _uri: &str,
        _credentials: &Credentials,
    ) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Hash algorithm named by a digest challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// MD5, the scheme default when the challenge names none.
    #[default]
    Md5,
    /// MD5 with session-keyed HA1.
    Md5Sess,
    /// SHA-256.
    Sha256,
    /// SHA-256 with session-keyed HA1.
    Sha256Sess,
}

impl DigestAlgorithm {
    fn parse(token: &str) -> Result<Self> {
        if token.eq_ignore_ascii_case("MD5") {
            Ok(Self::Md5)
        } else if token.eq_ignore_ascii_case("MD5-sess") {
            Ok(Self::Md5Sess)
        } else if token.eq_ignore_ascii_case("SHA-256") {
            Ok(Self::Sha256)
        } else if token.eq_ignore_ascii_case("SHA-256-sess") {
            Ok(Self::Sha256Sess)
        } else {
            Err(Error::auth_challenge(format!(
                "unsupported algorithm '{token}'"
            )))
        }
    }

    const fn is_session(self) -> bool {
        matches!(self, Self::Md5Sess | Self::Sha256Sess)
    }

    /// Token written back into the `Authorization` header.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
            Self::Sha256 => "SHA-256",
            Self::Sha256Sess => "SHA-256-sess",
        }
    }

    fn hash(self, data: &str) -> String {
        match self {
            Self::Md5 | Self::Md5Sess => hex_digest(&Md5::digest(data.as_bytes())),
            Self::Sha256 | Self::Sha256Sess => hex_digest(&Sha256::digest(data.as_bytes())),
        }
    }
}

/// Parsed `WWW-Authenticate: Digest` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    /// Protection realm the credentials apply to.
    pub realm: String,
    /// Server nonce echoed back in the response.
    pub nonce: String,
    /// Quality-of-protection list offered by the server.
    pub qop: Option<String>,
    /// Opaque blob echoed back verbatim.
    pub opaque: Option<String>,
    /// Hash algorithm to answer with.
    pub algorithm: DigestAlgorithm,
}

impl DigestChallenge {
    /// Parse a `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self> {
        let trimmed = header.trim();
        let (scheme, rest) = trimmed
            .split_once(' ')
            .ok_or_else(|| Error::auth_challenge("challenge has no parameters"))?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return Err(Error::auth_challenge(format!(
                "challenge scheme is '{scheme}', not digest"
            )));
        }

        let mut realm = None;
        let mut nonce = None;
        let mut qop = None;
        let mut opaque = None;
        let mut algorithm = DigestAlgorithm::Md5;

        for param in split_challenge_params(rest) {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let value = unquote(value.trim());
            match key.trim().to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "qop" => qop = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = DigestAlgorithm::parse(&value)?,
                _ => {}
            }
        }

        let realm = realm.ok_or_else(|| Error::auth_challenge("challenge is missing realm"))?;
        let nonce = nonce.ok_or_else(|| Error::auth_challenge("challenge is missing nonce"))?;

        Ok(Self {
            realm,
            nonce,
            qop,
            opaque,
            algorithm,
        })
    }
}

/// Compute the `Authorization` header value answering `challenge`.
///
/// The client nonce is a parameter so known-answer tests can pin it;
/// callers pass a fresh one per request.
fn authorization_header(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> Result<String> {
    let qop = match challenge.qop.as_deref() {
        None => None,
        Some(offered) => {
            if offered
                .split(',')
                .any(|q| q.trim().eq_ignore_ascii_case("auth"))
            {
                Some("auth")
            } else {
                return Err(Error::auth_challenge(format!(
                    "no supported qop in '{offered}'"
                )));
            }
        }
    };

    let algorithm = challenge.algorithm;
    let mut ha1 = algorithm.hash(&format!(
        "{}:{}:{}",
        credentials.username(),
        challenge.realm,
        credentials.api_key()
    ));
    if algorithm.is_session() {
        ha1 = algorithm.hash(&format!("{ha1}:{}:{cnonce}", challenge.nonce));
    }
    let ha2 = algorithm.hash(&format!("{method}:{uri}"));

    let response = match qop {
        Some(qop) => algorithm.hash(&format!(
            "{ha1}:{}:{NONCE_COUNT}:{cnonce}:{qop}:{ha2}",
            challenge.nonce
        )),
        // Compatibility form for servers that offer no qop.
        None => algorithm.hash(&format!("{ha1}:{}:{ha2}", challenge.nonce)),
    };

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\", algorithm={}",
        credentials.username(),
        challenge.realm,
        challenge.nonce,
        uri,
        response,
        algorithm.as_str(),
    );
    if let Some(qop) = qop {
        let _ = write!(header, ", qop={qop}, nc={NONCE_COUNT}, cnonce=\"{cnonce}\"");
    }
    if let Some(opaque) = challenge.opaque.as_deref() {
        let _ = write!(header, ", opaque=\"{opaque}\"");
    }

    Ok(header)
}

/// Split challenge parameters on commas, keeping quoted commas intact.
fn split_challenge_params(input: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                if !current.trim().is_empty() {
                    params.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        params.push(current.trim().to_string());
    }
    params
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().fold(
        String::with_capacity(bytes.len().saturating_mul(2)),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}
