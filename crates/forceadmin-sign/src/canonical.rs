use forceadmin_core::msg::ForceChangeAdminMsg;
use sha2::{Digest, Sha256};

/// JCS (RFC 8785) form of a request: keys sorted, no whitespace.
///
/// All three fields are strings, so only string escaping matters.
pub fn canonical_request(msg: &ForceChangeAdminMsg) -> Vec<u8> {
    let fields = [
        ("authority", msg.authority.as_str()),
        ("contract_addr", msg.contract_addr.as_str()),
        ("new_admin", msg.new_admin.as_str()),
    ];
    let body: Vec<String> = fields
        .iter()
        .map(|(k, v)| format!("\"{k}\":\"{}\"", escape_jcs(v)))
        .collect();
    format!("{{{}}}", body.join(",")).into_bytes()
}

/// `sha256:<hex>` digest of the canonical bytes.
pub fn request_digest(msg: &ForceChangeAdminMsg) -> String {
    format!("sha256:{:x}", Sha256::digest(canonical_request(msg)))
}

fn escape_jcs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
