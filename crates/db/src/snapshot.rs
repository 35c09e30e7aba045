//! Versioned JSON envelope for whole-collection snapshots.
//!
//! Version 1 blobs look like `{"schemaVersion": 1, "records": [...]}`. A bare JSON array is
//! the unversioned layout written before the envelope existed and is read as version 0.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const CURRENT_SCHEMA_VERSION: u64 = 1;

pub mod keys {
    pub const QUOTATIONS: &str = "starbags_quotations";
    pub const ORDERS: &str = "starbags_orders";
    pub const PAYMENTS: &str = "starbags_payments";
    pub const SAVED_PAYMENT_METHODS: &str = "starbags_saved_payment_methods";
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot `{key}` is corrupt: {source}")]
    Corrupt { key: String, source: serde_json::Error },
    #[error("snapshot `{key}` uses schema version {found}; newest supported is {supported}")]
    UnsupportedVersion { key: String, found: u64, supported: u64 },
    #[error("snapshot `{key}` could not be encoded: {source}")]
    Encode { key: String, source: serde_json::Error },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a, T> {
    schema_version: u64,
    records: &'a [T],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    schema_version: u64,
    records: Value,
}

pub fn encode<T: Serialize>(key: &str, records: &[T]) -> Result<String, SnapshotError> {
    serde_json::to_string(&EnvelopeRef { schema_version: CURRENT_SCHEMA_VERSION, records })
        .map_err(|source| SnapshotError::Encode { key: key.to_owned(), source })
}

pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<Vec<T>, SnapshotError> {
    let corrupt = |source| SnapshotError::Corrupt { key: key.to_owned(), source };

    let value: Value = serde_json::from_str(raw).map_err(corrupt)?;
    let (version, records) = match value {
        Value::Array(_) => (0, value),
        Value::Object(_) => {
            let envelope: Envelope = serde_json::from_value(value).map_err(corrupt)?;
            (envelope.schema_version, envelope.records)
        }
        _ => {
            return Err(corrupt(serde_json::Error::custom(
                "expected a record array or a versioned envelope",
            )));
        }
    };

    if version > CURRENT_SCHEMA_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            key: key.to_owned(),
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    serde_json::from_value(upgrade(version, records)).map_err(corrupt)
}

/// Version 0 records already carry the version 1 field names, so only the envelope differs.
/// Field migrations for later versions hook in here.
fn upgrade(_version: u64, records: Value) -> Value {
    records
}
