//! Call record model
//!
//! The record handed over by the PBX once a call has completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Final state of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Disposition {
    #[default]
    #[serde(rename = "NO ANSWER")]
    NoAnswer,
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "BUSY")]
    Busy,
    #[serde(rename = "ANSWERED")]
    Answered,
    #[serde(rename = "CONGESTION")]
    Congestion,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl Disposition {
    /// Map the PBX numeric disposition code
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Disposition::NoAnswer,
            1 => Disposition::Null,
            2 => Disposition::Failed,
            4 => Disposition::Busy,
            8 => Disposition::Answered,
            16 => Disposition::Congestion,
            _ => Disposition::Unknown,
        }
    }

    /// Canonical label written to the datastore
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::NoAnswer => "NO ANSWER",
            Disposition::Null => "NULL",
            Disposition::Failed => "FAILED",
            Disposition::Busy => "BUSY",
            Disposition::Answered => "ANSWERED",
            Disposition::Congestion => "CONGESTION",
            Disposition::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Automated message accounting flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AmaFlags {
    #[serde(rename = "OMIT")]
    Omit,
    #[serde(rename = "BILLING")]
    Billing,
    #[default]
    #[serde(rename = "DOCUMENTATION")]
    Documentation,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl AmaFlags {
    /// Map the PBX numeric AMA flag
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => AmaFlags::Omit,
            2 => AmaFlags::Billing,
            3 => AmaFlags::Documentation,
            _ => AmaFlags::Unknown,
        }
    }

    /// Canonical label written to the datastore
    pub fn as_str(&self) -> &'static str {
        match self {
            AmaFlags::Omit => "OMIT",
            AmaFlags::Billing => "BILLING",
            AmaFlags::Documentation => "DOCUMENTATION",
            AmaFlags::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AmaFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call record (one completed call)
///
/// Timestamps carry seconds resolution. An unset timestamp, such as the answer
/// time of a call that was never answered, is the Unix epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallRecord {
    /// Account code
    pub account_code: String,

    /// Caller number
    pub src: String,

    /// Destination extension
    pub dst: String,

    /// Destination context
    pub dcontext: String,

    /// Caller ID string
    pub clid: String,

    /// Originating channel, e.g. `SIP/alice-00000001`
    pub channel: String,

    /// Destination channel
    pub dst_channel: String,

    /// Last dialplan application executed
    pub last_app: String,

    /// Argument of the last application
    pub last_data: String,

    /// Call start
    pub start: DateTime<Utc>,

    /// Call answer
    pub answer: DateTime<Utc>,

    /// Call end
    pub end: DateTime<Utc>,

    /// Total duration in seconds
    pub duration: i64,

    /// Billable seconds
    pub billsec: i64,

    /// Label (`"ANSWERED"`) or PBX numeric code (`8`)
    #[serde(deserialize_with = "disposition_from_label_or_code")]
    pub disposition: Disposition,

    /// Label (`"BILLING"`) or PBX numeric code (`2`)
    #[serde(deserialize_with = "ama_flags_from_label_or_code")]
    pub ama_flags: AmaFlags,

    /// Unique call identifier
    pub unique_id: String,

    /// Free-form user field
    pub user_field: String,

    /// Channel variables available for custom-field export
    pub variables: HashMap<String, String>,
}

impl CallRecord {
    /// Look up a custom field by exact, case-sensitive name
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Set a custom field, returning the record
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// A code field as it arrives on the wire
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelOrCode<T> {
    Code(i64),
    Label(T),
}

fn label_or_code<'de, D, T>(deserializer: D, from_code: fn(i64) -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match LabelOrCode::deserialize(deserializer)? {
        LabelOrCode::Code(code) => from_code(code),
        LabelOrCode::Label(label) => label,
    })
}

fn disposition_from_label_or_code<'de, D>(deserializer: D) -> Result<Disposition, D::Error>
where
    D: Deserializer<'de>,
{
    label_or_code(deserializer, Disposition::from_code)
}

fn ama_flags_from_label_or_code<'de, D>(deserializer: D) -> Result<AmaFlags, D::Error>
where
    D: Deserializer<'de>,
{
    label_or_code(deserializer, AmaFlags::from_code)
}
