//! AWS Signature Version 4 query-string presigning for S3

use chrono::{DateTime, Utc};
use ring::hmac;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{Result, ServiceError};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Credentials and scope used to sign requests
#[derive(Debug, Clone)]
pub struct Signer {
    access_key: String,
    secret_key: String,
    region: String,
}

impl Signer {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    /// Presign `method` against `object_url`.
    ///
    /// `signed_headers` are headers the caller will send verbatim with the
    /// request; the host header is always signed.
    pub fn presign(
        &self,
        method: &str,
        object_url: &str,
        expires_seconds: u64,
        signed_headers: &[(&str, &str)],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let mut url = Url::parse(object_url)
            .map_err(|e| ServiceError::configuration(format!("Invalid object URL {}: {}", object_url, e)))?;

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ServiceError::configuration(format!("Object URL has no host: {}", object_url))),
        };

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);

        let mut headers: Vec<(String, String)> = signed_headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
            .collect();
        headers.push(("host".to_string(), host));
        headers.sort();

        let signed_header_names = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let mut query = vec![
            ("X-Amz-Algorithm".to_string(), ALGORITHM.to_string()),
            ("X-Amz-Credential".to_string(), format!("{}/{}", self.access_key, scope)),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            ("X-Amz-Expires".to_string(), expires_seconds.to_string()),
            ("X-Amz-SignedHeaders".to_string(), signed_header_names.clone()),
        ];
        query.sort();

        let canonical_query = query
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_headers: String = headers.iter().map(|(k, v)| format!("{}:{}\n", k, v)).collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method,
            url.path(),
            canonical_query,
            canonical_headers,
            signed_header_names,
            UNSIGNED_PAYLOAD
        );

        let string_to_sign = format!(
            "{}\n{}\n{}\n{:x}",
            ALGORITHM,
            amz_date,
            scope,
            Sha256::digest(canonical_request.as_bytes())
        );

        let signing_key = [date.as_str(), self.region.as_str(), SERVICE, "aws4_request"]
            .iter()
            .fold(format!("AWS4{}", self.secret_key).into_bytes(), |key, part| {
                hmac_sha256(&key, part.as_bytes())
            });
        let signature = to_hex(&hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        url.set_query(Some(&format!("{}&X-Amz-Signature={}", canonical_query, signature)));
        Ok(url.to_string())
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Percent-encode everything outside the SigV4 unreserved set
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());

    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => encoded.push(byte as char),
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    encoded
}
