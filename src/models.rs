use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentGroup {
    pub id: u64,
    pub name: String,
    pub course_id: u64,
    pub group_weight: f64,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    #[serde(default, with = "iso_instant_opt")]
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub learner_id: u64,
    pub assignment_id: u64,
    pub submission: SubmissionDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionDetail {
    #[serde(with = "iso_instant")]
    pub submitted_at: DateTime<Utc>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearnerRecord {
    pub id: u64,
    pub avg: f64,
    pub scores: BTreeMap<u64, f64>,
}

// Serialized flat: {"id": .., "avg": .., "<assignment_id>": percentage, ..}
impl Serialize for LearnerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scores.len() + 2))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("avg", &self.avg)?;
        for (assignment_id, percentage) in &self.scores {
            map.serialize_entry(&assignment_id.to_string(), percentage)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentSummary {
    pub assignment_id: u64,
    pub name: String,
    pub points_possible: f64,
    pub due_at: Option<DateTime<Utc>>,
    pub submission_count: usize,
    pub avg_percentage: f64,
}

#[derive(Debug, Clone)]
pub struct LateSubmission {
    pub learner_id: u64,
    pub assignment_name: String,
    pub submitted_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

// Accepts RFC 3339, a naive timestamp, or a bare date (read as midnight UTC).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

pub(crate) mod iso_instant {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_instant(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unrecognized ISO-8601 instant: {raw}"))
        })
    }
}

pub(crate) mod iso_instant_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(|instant| instant.to_rfc3339()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => super::parse_instant(&raw).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("unrecognized ISO-8601 instant: {raw}"))
            }),
        }
    }
}
