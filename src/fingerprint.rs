//! Request fingerprinting for deterministic interaction lookup

use std::fmt;

use sha2::{Digest, Sha256};

use crate::cassette::InteractionRequest;

/// Opaque equality key derived from an [`InteractionRequest`]
///
/// Only the replay engine produces fingerprints; the adapter compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Raw digest bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex prefix for log lines
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Compute the SHA-256 fingerprint of an interaction request
///
/// The digest covers, each length-prefixed:
/// 1. Protocol
/// 2. Action (method, verbatim)
/// 3. Target (path and raw query)
/// 4. Header count, then every name/value pair in order
/// 5. Body
///
/// Nothing is normalized. Header order, header name case and query
/// parameter order all change the fingerprint.
#[must_use]
pub fn fingerprint_request(request: &InteractionRequest) -> Fingerprint {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, request.protocol.as_str().as_bytes());
    update_field(&mut hasher, request.action.as_str().as_bytes());
    update_field(&mut hasher, request.target.as_bytes());

    hasher.update((request.headers.len() as u32).to_le_bytes());
    for (name, value) in &request.headers {
        update_field(&mut hasher, name.as_bytes());
        update_field(&mut hasher, value.as_bytes());
    }

    update_field(&mut hasher, &request.body);

    Fingerprint(hasher.finalize().into())
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u32).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::Protocol;
    use bytes::Bytes;
    use hyper::Method;

    fn test_request() -> InteractionRequest {
        InteractionRequest {
            protocol: Protocol::Http,
            action: Method::GET,
            target: "/api/test".to_string(),
            headers: vec![],
            body: Bytes::new(),
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let request = test_request();
        let hash1 = fingerprint_request(&request);
        let hash2 = fingerprint_request(&request.clone());

        assert_eq!(hash1, hash2, "Fingerprint must be deterministic");
    }

    #[test]
    fn test_fingerprint_different_methods() {
        let req1 = test_request();
        let mut req2 = test_request();
        req2.action = Method::POST;

        assert_ne!(fingerprint_request(&req1), fingerprint_request(&req2));
    }

    #[test]
    fn test_fingerprint_query_is_significant() {
        let mut req1 = test_request();
        req1.target = "/x?a=1".to_string();

        let mut req2 = test_request();
        req2.target = "/x?a=2".to_string();

        assert_ne!(fingerprint_request(&req1), fingerprint_request(&req2));
    }

    #[test]
    fn test_header_order_is_significant() {
        let mut req1 = test_request();
        req1.headers = vec![
            ("accept".to_string(), "text/plain".to_string()),
            ("x-role".to_string(), "admin".to_string()),
        ];

        let mut req2 = test_request();
        req2.headers = vec![
            ("x-role".to_string(), "admin".to_string()),
            ("accept".to_string(), "text/plain".to_string()),
        ];

        assert_ne!(fingerprint_request(&req1), fingerprint_request(&req2));
    }

    #[test]
    fn test_header_presence_is_significant() {
        let req1 = test_request();
        let mut req2 = test_request();
        req2.headers = vec![("x-role".to_string(), String::new())];

        assert_ne!(fingerprint_request(&req1), fingerprint_request(&req2));
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let mut req1 = test_request();
        req1.headers = vec![("ab".to_string(), "c".to_string())];

        let mut req2 = test_request();
        req2.headers = vec![("a".to_string(), "bc".to_string())];

        assert_ne!(fingerprint_request(&req1), fingerprint_request(&req2));
    }

    #[test]
    fn test_protocol_is_significant() {
        let req1 = test_request();
        let mut req2 = test_request();
        req2.protocol = Protocol::Other("grpc".to_string());

        assert_ne!(fingerprint_request(&req1), fingerprint_request(&req2));
    }

    #[test]
    fn test_display_is_full_hex() {
        let fingerprint = fingerprint_request(&test_request());

        assert_eq!(fingerprint.to_string().len(), 64);
        assert_eq!(fingerprint.short().len(), 16);
        assert!(fingerprint.to_string().starts_with(&fingerprint.short()));
    }
}
