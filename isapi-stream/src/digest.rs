//! HTTP Digest challenge parsing and response computation.
//!
//! Cameras guard the alert stream behind Digest authentication: the first
//! GET earns a 401 carrying a `WWW-Authenticate: Digest ...` challenge, and
//! the request is replayed with an `Authorization` header answering it. This
//! module implements the RFC 2617 MD5 scheme with `qop="auth"` support,
//! which is what ISAPI firmware offers.

use crate::error::StreamError;

/// A parsed `WWW-Authenticate: Digest` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    /// Protection realm the credentials apply to
    pub realm: String,
    /// Server nonce to hash into the response
    pub nonce: String,
    /// Offered quality-of-protection list, e.g. `auth` or `auth,auth-int`
    pub qop: Option<String>,
    /// Opaque token to echo back verbatim
    pub opaque: Option<String>,
    /// Digest algorithm name, echoed back when present
    pub algorithm: Option<String>,
}

impl DigestChallenge {
    /// Parse the value of a `WWW-Authenticate` header.
    ///
    /// Unknown parameters are ignored; a missing realm or nonce makes the
    /// challenge unusable and is reported as [`StreamError::Challenge`].
    pub fn parse(header: &str) -> Result<Self, StreamError> {
        let header = header.trim();
        let params = header
            .strip_prefix("Digest ")
            .or_else(|| header.strip_prefix("digest "))
            .ok_or_else(|| {
                StreamError::Challenge(format!("not a Digest challenge: {header:?}"))
            })?;

        let mut realm = None;
        let mut nonce = None;
        let mut qop = None;
        let mut opaque = None;
        let mut algorithm = None;

        for part in split_quoted(params, ',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "qop" => qop = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            realm: realm
                .ok_or_else(|| StreamError::Challenge("challenge has no realm".to_string()))?,
            nonce: nonce
                .ok_or_else(|| StreamError::Challenge("challenge has no nonce".to_string()))?,
            qop,
            opaque,
            algorithm,
        })
    }

    /// Build the `Authorization` header value answering this challenge.
    pub fn respond(&self, username: &str, password: &str, method: &str, uri: &str) -> String {
        let cnonce = format!("{:016x}", rand::random::<u64>());
        self.respond_with(username, password, method, uri, &cnonce, 1)
    }

    /// Deterministic response construction; `respond` supplies a fresh
    /// client nonce on top of this.
    fn respond_with(
        &self,
        username: &str,
        password: &str,
        method: &str,
        uri: &str,
        cnonce: &str,
        nc: u32,
    ) -> String {
        let ha1 = hash(&format!("{username}:{}:{password}", self.realm));
        let ha2 = hash(&format!("{method}:{uri}"));

        let response = if self.offers_auth_qop() {
            hash(&format!(
                "{ha1}:{}:{nc:08x}:{cnonce}:auth:{ha2}",
                self.nonce
            ))
        } else {
            hash(&format!("{ha1}:{}:{ha2}", self.nonce))
        };

        let mut header = format!(
            "Digest username=\"{username}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\", response=\"{response}\"",
            self.realm, self.nonce
        );
        if self.offers_auth_qop() {
            header.push_str(&format!(", qop=auth, nc={nc:08x}, cnonce=\"{cnonce}\""));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{opaque}\""));
        }
        if let Some(algorithm) = &self.algorithm {
            header.push_str(&format!(", algorithm={algorithm}"));
        }
        header
    }

    /// Whether the server offered the plain `auth` quality of protection.
    fn offers_auth_qop(&self) -> bool {
        self.qop
            .as_deref()
            .map(|qop| qop.split(',').any(|token| token.trim() == "auth"))
            .unwrap_or(false)
    }
}

fn hash(input: &str) -> String {
    format!("{:x}", md5::compute(input))
}

/// Split on `separator` outside of double-quoted sections.
fn split_quoted(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => {
                parts.push(&input[start..index]);
                start = index + separator.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC2617_CHALLENGE: &str = "Digest realm=\"testrealm@host.com\", \
        qop=\"auth,auth-int\", \
        nonce=\"dcd98b7102dd2f0e8b11d0f600bfb0c093\", \
        opaque=\"5ccc069c403ebaf9f0171e9517f40e41\"";

    #[test]
    fn parses_full_challenge() {
        let challenge = DigestChallenge::parse(RFC2617_CHALLENGE).unwrap();
        assert_eq!(challenge.realm, "testrealm@host.com");
        assert_eq!(challenge.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(challenge.qop.as_deref(), Some("auth,auth-int"));
        assert_eq!(
            challenge.opaque.as_deref(),
            Some("5ccc069c403ebaf9f0171e9517f40e41")
        );
        assert!(challenge.algorithm.is_none());
    }

    #[test]
    fn parses_minimal_challenge() {
        let challenge =
            DigestChallenge::parse("Digest realm=\"cam\", nonce=\"abc123\"").unwrap();
        assert_eq!(challenge.realm, "cam");
        assert_eq!(challenge.nonce, "abc123");
        assert!(challenge.qop.is_none());
    }

    #[test]
    fn rejects_other_schemes() {
        let result = DigestChallenge::parse("Basic realm=\"cam\"");
        assert!(matches!(result, Err(StreamError::Challenge(_))));
    }

    #[test]
    fn rejects_challenge_without_nonce() {
        let result = DigestChallenge::parse("Digest realm=\"cam\"");
        assert!(matches!(result, Err(StreamError::Challenge(_))));
    }

    #[test]
    fn quoted_commas_do_not_split_parameters() {
        let challenge =
            DigestChallenge::parse("Digest realm=\"a,b\", nonce=\"n\"").unwrap();
        assert_eq!(challenge.realm, "a,b");
    }

    #[test]
    fn response_matches_rfc2617_worked_example() {
        let challenge = DigestChallenge::parse(RFC2617_CHALLENGE).unwrap();
        let header = challenge.respond_with(
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            "0a4f113b",
            1,
        );
        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
        assert!(header.contains("username=\"Mufasa\""));
        assert!(header.contains("uri=\"/dir/index.html\""));
        assert!(header.contains("qop=auth"));
        assert!(header.contains("nc=00000001"));
        assert!(header.contains("cnonce=\"0a4f113b\""));
        assert!(header.contains("opaque=\"5ccc069c403ebaf9f0171e9517f40e41\""));
    }

    #[test]
    fn response_without_qop_uses_legacy_form() {
        let challenge =
            DigestChallenge::parse("Digest realm=\"cam\", nonce=\"abc\"").unwrap();
        let header = challenge.respond_with("admin", "secret", "GET", "/stream", "ignored", 1);
        assert!(!header.contains("qop="));
        assert!(!header.contains("cnonce="));
    }

    #[test]
    fn fresh_client_nonces_differ() {
        let challenge = DigestChallenge::parse(RFC2617_CHALLENGE).unwrap();
        let a = challenge.respond("admin", "secret", "GET", "/stream");
        let b = challenge.respond("admin", "secret", "GET", "/stream");
        assert_ne!(a, b);
    }
}
