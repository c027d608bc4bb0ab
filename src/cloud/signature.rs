/// Cloudinary authenticated request signing
///
/// Parameters are sorted by name, joined as `key=value&key=value`, the API
/// secret is appended, and the result is hashed. We always request SHA-256
/// (`signature_algorithm=sha256` is sent with the call).
use sha2::{Digest, Sha256};

pub const SIGNATURE_ALGORITHM: &str = "sha256";

/// Parameters that are sent but never signed
const UNSIGNED_PARAMS: [&str; 6] = [
    "file",
    "cloud_name",
    "resource_type",
    "api_key",
    "signature",
    "signature_algorithm",
];

/// The canonical string Cloudinary expects before the secret is appended
pub fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut signed: Vec<&(&str, &str)> = params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !UNSIGNED_PARAMS.contains(key))
        .collect();
    signed.sort_by(|a, b| a.0.cmp(b.0));

    signed
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex SHA-256 signature for `params`
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
