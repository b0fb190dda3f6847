use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coordinates and bounds of a log read.
///
/// Records are addressed by `(cluster, component, instance)`: the log group is the
/// cluster, the stream is `<component>/<instance>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogQuery {
    pub cluster: String,
    pub component: String,
    pub instance: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub start_from_head: bool,
}

impl LogQuery {
    pub fn log_group(&self) -> String {
        format!("/corral/{}", self.cluster)
    }

    pub fn log_stream(&self) -> String {
        format!("{}/{}", self.component, self.instance)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub ingestion_time: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogPage {
    pub events: Vec<LogEvent>,
    #[serde(default)]
    pub next_forward_token: Option<String>,
    #[serde(default)]
    pub next_backward_token: Option<String>,
}
