use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

/// Get UTC date time string for AWS SigV4 signing.
/// e.g. 20240101T003000Z
pub(crate) fn get_amz_date_time_string(now: &DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// 签名范围中使用的日期，例如 20240101
pub(crate) fn get_amz_date_string(now: &DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Hmac-SHA256 digest
pub(crate) fn hmac_sha256(key_data: &[u8], msg_data: &[u8]) -> Vec<u8> {
    type HmacSha256 = Hmac<Sha256>;
    // Hmac accepts keys of any size
    let mut mac = HmacSha256::new_from_slice(key_data).expect("hmac accepts keys of any length");
    mac.update(msg_data);
    let ret = mac.finalize();
    ret.into_bytes().to_vec()
}

pub(crate) fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let data = hasher.finalize();
    data.to_vec()
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
