use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const PROVIDER: &str = "glassdoor";
pub const STATUS_NEW: &str = "new";

/// Persisted column order of a job record.
pub const MASTERLIST_HEADER: [&str; 10] = [
    "status",
    "title",
    "company",
    "location",
    "raw_date",
    "normalized_date",
    "blurb",
    "link",
    "id",
    "provider",
];

/// Scraped records keyed by provider job id.
pub type JobMap = HashMap<String, JobRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub raw_date: String,
    pub normalized_date: String,
    pub link: String,
    pub blurb: String,
    pub status: String,
    pub provider: String,
}

impl JobRecord {
    /// A fresh listing. Optional fields start empty and are filled by the
    /// extractor, the date normalizer and the blurb phase.
    pub fn new(title: String, company: String, location: String) -> Self {
        JobRecord {
            id: String::new(),
            title,
            company,
            location,
            raw_date: String::new(),
            normalized_date: String::new(),
            link: String::new(),
            blurb: String::new(),
            status: STATUS_NEW.to_string(),
            provider: PROVIDER.to_string(),
        }
    }

    /// Field values in `MASTERLIST_HEADER` order.
    pub fn columns(&self) -> [&str; 10] {
        [
            self.status.as_str(),
            self.title.as_str(),
            self.company.as_str(),
            self.location.as_str(),
            self.raw_date.as_str(),
            self.normalized_date.as_str(),
            self.blurb.as_str(),
            self.link.as_str(),
            self.id.as_str(),
            self.provider.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_defaults() {
        let r = JobRecord::new("Engineer".into(), "Acme".into(), "Toronto, ON".into());
        assert_eq!(r.status, "new");
        assert_eq!(r.provider, "glassdoor");
        assert!(r.id.is_empty() && r.link.is_empty() && r.blurb.is_empty());
        assert!(r.raw_date.is_empty() && r.normalized_date.is_empty());
    }

    #[test]
    fn columns_follow_header() {
        let mut r = JobRecord::new("Engineer".into(), "Acme".into(), "Toronto, ON".into());
        r.id = "42".into();
        let cols = r.columns();
        let idx = |name: &str| MASTERLIST_HEADER.iter().position(|h| *h == name).unwrap();
        assert_eq!(cols[idx("title")], "Engineer");
        assert_eq!(cols[idx("id")], "42");
        assert_eq!(cols[idx("provider")], "glassdoor");
    }
}
