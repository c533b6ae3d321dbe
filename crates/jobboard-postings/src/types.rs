use serde::{Deserialize, Serialize};

/// A single job listing as written by the ingestion pipeline.
///
/// Read-only from the service's point of view; rows are created and updated
/// by the external script (or the `import` command) keyed on `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    /// Primary key, assigned by the ingestion side and never changed.
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub province: String,
    /// Lower bound of the annual salary, when the listing gives one.
    #[serde(default)]
    pub min_salary_pa: Option<i64>,
    /// Upper bound of the annual salary, when the listing gives one.
    #[serde(default)]
    pub max_salary_pa: Option<i64>,
    /// Comma-separated skill list, unparsed.
    #[serde(default)]
    pub skills: String,
}

impl JobPosting {
    /// True when this posting's province equals `province` ignoring case.
    pub fn in_province(&self, province: &str) -> bool {
        self.province.to_lowercase() == province.to_lowercase()
    }
}
