//! Report payloads
//!
//! Wraps an ordered record list in a payload stamped with producer
//! metadata, so downstream sinks can tell which tool and which run
//! produced a given report. The records themselves stay exactly as the
//! pipeline emitted them; any sentinel-to-display translation is the
//! sink's job.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BOXLOG_VERSION, PRODUCER_NAME};

/// Identity of the producing tool and invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerInfo {
    pub name: String,
    pub version: String,
    /// Unique id for this invocation.
    pub run_id: String,
}

impl ProducerInfo {
    fn current() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: BOXLOG_VERSION.to_string(),
            run_id: Uuid::new_v4().to_string(),
        }
    }
}

/// A producer-stamped report over an ordered record list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<T> {
    pub producer: ProducerInfo,
    pub records: Vec<T>,
}

impl<T: Serialize> Report<T> {
    /// Stamp `records` with the current producer identity.
    pub fn new(records: Vec<T>) -> Self {
        Self {
            producer: ProducerInfo::current(),
            records,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
