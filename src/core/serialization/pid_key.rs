/*!
 * PID Map Keys
 *
 * The durable store keys records and memory by PID-as-string. Integer PIDs
 * must round-trip exactly, so only the canonical decimal spelling is
 * accepted: no sign, no leading zeros, no whitespace, no overflow. That
 * spelling is what `serde_json` writes for integer map keys.
 */

use crate::core::types::Pid;

/// Parse a canonical PID key, rejecting every non-canonical spelling
pub fn parse_pid_key(key: &str) -> Option<Pid> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    key.parse::<Pid>().ok()
}
