/*!
 * State Snapshot
 * Wire shape of the durable blob
 *
 * ```json
 * {
 *   "header":  {"version": 1, "nextPid": 4, "cycle": 12},
 *   "records": {"1": {"parentPid": null, "className": "init", "status": "RUNNING", "priority": 100, "createdAt": 0}},
 *   "memory":  {"1": {"ticks": 12}}
 * }
 * ```
 *
 * Records and memory are separate maps keyed by PID-as-string. Encoding goes
 * through `BTreeMap<Pid, _>`, so keys come out canonical and in numeric
 * order. Decoding reads string keys and parses each one strictly.
 */

use crate::core::errors::{PersistenceError, PersistenceResult};
use crate::core::limits::{FIRST_PID, INITIAL_CYCLE, STATE_FORMAT_VERSION};
use crate::core::serialization::{from_json, parse_pid_key, to_json};
use crate::core::types::{Cycle, Pid};
use crate::process::ProcessRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Counters that outlive any single process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateHeader {
    pub version: u32,
    pub next_pid: Pid,
    pub cycle: Cycle,
}

impl Default for StateHeader {
    fn default() -> Self {
        Self {
            version: STATE_FORMAT_VERSION,
            next_pid: FIRST_PID,
            cycle: INITIAL_CYCLE,
        }
    }
}

/// Decoded durable state
///
/// Record `pid` fields are filled from the map keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub header: StateHeader,
    pub records: BTreeMap<Pid, ProcessRecord>,
    pub memory: BTreeMap<Pid, Value>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    header: StateHeader,
    #[serde(default)]
    records: BTreeMap<String, ProcessRecord>,
    #[serde(default)]
    memory: BTreeMap<String, Value>,
}

impl StateSnapshot {
    pub fn encode(&self) -> PersistenceResult<Vec<u8>> {
        Ok(to_json(self)?)
    }

    pub fn decode(bytes: &[u8]) -> PersistenceResult<Self> {
        let raw: RawSnapshot = from_json(bytes)?;

        if raw.header.version > STATE_FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: raw.header.version,
                supported: STATE_FORMAT_VERSION,
            });
        }

        let records = raw
            .records
            .into_iter()
            .map(|(key, record)| pid_from_key(&key).map(|pid| (pid, record.with_pid(pid))))
            .collect::<PersistenceResult<BTreeMap<_, _>>>()?;

        let memory = raw
            .memory
            .into_iter()
            .map(|(key, value)| pid_from_key(&key).map(|pid| (pid, value)))
            .collect::<PersistenceResult<BTreeMap<_, _>>>()?;

        Ok(Self {
            header: raw.header,
            records,
            memory,
        })
    }
}

fn pid_from_key(key: &str) -> PersistenceResult<Pid> {
    parse_pid_key(key).ok_or_else(|| PersistenceError::InvalidPidKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_encoding_is_canonical() {
        let mut snapshot = StateSnapshot {
            header: StateHeader {
                version: STATE_FORMAT_VERSION,
                next_pid: 11,
                cycle: 3,
            },
            ..StateSnapshot::default()
        };
        snapshot.records.insert(10, ProcessRecord::new(10, "b", 1, None, 2));
        snapshot.records.insert(2, ProcessRecord::new(2, "a", 5, Some(10), 0));
        snapshot.memory.insert(10, json!({"n": 1}));

        let encoded = String::from_utf8(snapshot.encode().unwrap()).unwrap();
        assert_eq!(
            encoded,
            concat!(
                r#"{"header":{"version":1,"nextPid":11,"cycle":3},"#,
                r#""records":{"2":{"parentPid":10,"className":"a","status":"PENDING","priority":5,"createdAt":0},"#,
                r#""10":{"parentPid":null,"className":"b","status":"PENDING","priority":1,"createdAt":2}},"#,
                r#""memory":{"10":{"n":1}}}"#
            )
        );
    }

    #[test]
    fn test_decode_fills_pids_from_keys() {
        let blob = json!({
            "header": {"version": 1, "nextPid": 8, "cycle": 4},
            "records": {"7": {"className": "worker", "status": "SUSPENDED", "priority": 3, "createdAt": 1}},
            "memory": {"7": [1, 2, 3]}
        });
        let snapshot = StateSnapshot::decode(&serde_json::to_vec(&blob).unwrap()).unwrap();

        let record = &snapshot.records[&7];
        assert_eq!(record.pid, 7);
        assert_eq!(record.status, ProcessStatus::Suspended);
        assert_eq!(record.parent_pid, None);
        assert_eq!(snapshot.memory[&7], json!([1, 2, 3]));
        assert_eq!(snapshot.header.next_pid, 8);
    }

    #[test]
    fn test_decode_rejects_non_canonical_key() {
        let blob = br#"{"records":{"07":{"className":"w","status":"PENDING","priority":0,"createdAt":0}}}"#;
        assert!(matches!(
            StateSnapshot::decode(blob),
            Err(PersistenceError::InvalidPidKey(key)) if key == "07"
        ));

        let blob = br#"{"memory":{"-1":{}}}"#;
        assert!(matches!(
            StateSnapshot::decode(blob),
            Err(PersistenceError::InvalidPidKey(_))
        ));
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let blob = br#"{"header":{"version":2,"nextPid":1,"cycle":0}}"#;
        assert!(matches!(
            StateSnapshot::decode(blob),
            Err(PersistenceError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn test_decode_missing_sections_default() {
        let snapshot = StateSnapshot::decode(b"{}").unwrap();
        assert_eq!(snapshot, StateSnapshot::default());
    }

    #[test]
    fn test_decode_corrupt_blob() {
        assert!(matches!(
            StateSnapshot::decode(b"{\"records\":"),
            Err(PersistenceError::Json(_))
        ));
    }
}
