use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body returned by the quote endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResult {
    pub server: String,
    pub quote: String,
    pub time: DateTime<Utc>,
}

/// Echo of the inbound request, returned by the debug endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugInfo {
    pub server: String,
    pub time: DateTime<Utc>,
    pub method: String,
    pub host: String,
    pub proto: String,
    pub url: String,
    pub remoteaddr: String,
    pub headers: HashMap<String, Vec<String>>,
    pub body: String,
}
