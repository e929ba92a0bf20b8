/*!
 * Serialization Utilities
 *
 * Serialization helpers for the durable state blob:
 * - JSON encode/decode with strongly-typed errors
 * - Canonical PID map keys (integer PIDs stored as decimal strings)
 *
 * # Determinism
 *
 * Equal values must encode to byte-identical blobs so that a load followed
 * by a store without scheduling leaves the durable store unchanged. Maps are
 * therefore always `BTreeMap`s and PID keys use one canonical spelling.
 */

pub mod json;
pub mod pid_key;

pub use json::{from_slice as from_json, to_vec as to_json, JsonError, JsonResult};
pub use pid_key::parse_pid_key;
