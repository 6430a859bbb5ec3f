//! Graph API data types

use crate::types::JsonValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One page of a paged edge
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Continuation token for the next page, if any
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// A page with no continuation
    pub fn last(data: Vec<T>) -> Self {
        Self { data, next: None }
    }

    /// A page followed by another
    pub fn with_next(data: Vec<T>, next: impl Into<String>) -> Self {
        Self {
            data,
            next: Some(next.into()),
        }
    }
}

/// Insight aggregation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Daily values
    Day,
    /// Rolling 7 days
    Week,
    /// Rolling 28 days
    #[serde(rename = "days_28")]
    Days28,
    /// Lifetime value
    Lifetime,
}

impl Period {
    /// API name of the period
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Days28 => "days_28",
            Period::Lifetime => "lifetime",
        }
    }

    /// Whether metric keys of this period get a `_<period>` suffix
    pub fn suffixes_metric(self) -> bool {
        matches!(self, Period::Week | Period::Days28)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an insights request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightQuery {
    /// Metrics to fetch
    pub metrics: Vec<String>,
    /// Aggregation period
    pub period: Option<Period>,
    /// Window start
    pub since: Option<NaiveDate>,
    /// Window end
    pub until: Option<NaiveDate>,
}

impl InsightQuery {
    /// Create a query for the given metrics
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the period
    #[must_use]
    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Set the date window
    #[must_use]
    pub fn between(mut self, since: NaiveDate, until: NaiveDate) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Query string parameters for this request
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("metric".to_string(), self.metrics.join(","))];
        if let Some(period) = self.period {
            params.push(("period".to_string(), period.as_str().to_string()));
        }
        if let Some(since) = self.since {
            params.push(("since".to_string(), since.format("%Y-%m-%d").to_string()));
        }
        if let Some(until) = self.until {
            params.push(("until".to_string(), until.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

/// A metric returned by the insights edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightMetric {
    /// Metric name
    pub name: String,
    /// Period the values are aggregated over
    #[serde(default)]
    pub period: Option<String>,
    /// Time-bucketed values
    #[serde(default)]
    pub values: Vec<InsightValue>,
    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,
    /// Metric object id
    #[serde(default)]
    pub id: Option<String>,
}

impl InsightMetric {
    /// The first value, which is the only one for object-level insights
    pub fn first_value(&self) -> Option<&InsightValue> {
        self.values.first()
    }
}

/// A single value of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightValue {
    /// The value; a number or, for audience metrics, an object
    #[serde(default)]
    pub value: JsonValue,
    /// End of the bucket the value belongs to
    #[serde(default)]
    pub end_time: Option<String>,
}
