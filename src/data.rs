use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::models::{
    parse_instant, Assignment, AssignmentGroup, Course, Submission, SubmissionDetail,
};

pub fn load_course(path: &Path) -> anyhow::Result<Course> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read course file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse course file {}", path.display()))
}

pub fn load_group(path: &Path) -> anyhow::Result<AssignmentGroup> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assignment group file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse assignment group file {}", path.display()))
}

// Returns the parsed submissions plus a count of rows that failed to parse
// and were skipped. CSV files carry flat rows, anything else is a JSON array.
pub fn load_submissions(path: &Path) -> anyhow::Result<(Vec<Submission>, usize)> {
    if path.extension().and_then(|ext| ext.to_str()) == Some("csv") {
        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to read submissions file {}", path.display()))?;
        parse_submissions_csv(reader)
    } else {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read submissions file {}", path.display()))?;
        parse_submissions_json(&raw)
    }
}

pub fn parse_submissions_json(raw: &str) -> anyhow::Result<(Vec<Submission>, usize)> {
    let values: Vec<Value> =
        serde_json::from_str(raw).context("submissions input is not a JSON array")?;

    let mut submissions = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for value in values {
        match serde_json::from_value::<Submission>(value) {
            Ok(submission) => submissions.push(submission),
            Err(_) => skipped += 1,
        }
    }

    Ok((submissions, skipped))
}

pub fn parse_submissions_csv<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<(Vec<Submission>, usize)> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        learner_id: u64,
        assignment_id: u64,
        submitted_at: String,
        score: f64,
    }

    let mut submissions = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let Ok(row) = result else {
            skipped += 1;
            continue;
        };
        let Some(submitted_at) = parse_instant(&row.submitted_at) else {
            skipped += 1;
            continue;
        };
        submissions.push(Submission {
            learner_id: row.learner_id,
            assignment_id: row.assignment_id,
            submission: SubmissionDetail {
                submitted_at,
                score: row.score,
            },
        });
    }

    Ok((submissions, skipped))
}

pub fn sample_course() -> Course {
    Course {
        id: 451,
        name: "Intro to Data Analysis".to_string(),
    }
}

pub fn sample_group() -> anyhow::Result<AssignmentGroup> {
    Ok(AssignmentGroup {
        id: 12345,
        name: "Unit Fundamentals".to_string(),
        course_id: 451,
        group_weight: 25.0,
        assignments: vec![
            Assignment {
                id: 1,
                name: "Unit 1 Quiz".to_string(),
                due_at: Some(parse_instant("2023-01-25").context("invalid due date")?),
                points_possible: 50.0,
            },
            Assignment {
                id: 2,
                name: "Midterm Project".to_string(),
                due_at: Some(parse_instant("2023-02-27").context("invalid due date")?),
                points_possible: 150.0,
            },
            Assignment {
                id: 3,
                name: "Final Portfolio".to_string(),
                due_at: Some(parse_instant("3156-11-15").context("invalid due date")?),
                points_possible: 500.0,
            },
        ],
    })
}

pub fn sample_submissions() -> anyhow::Result<Vec<Submission>> {
    let rows = [
        (125u64, 1u64, "2023-01-25", 47.0),
        (125, 2, "2023-02-12", 150.0),
        (125, 3, "2023-01-25", 400.0),
        (132, 1, "2023-01-24", 39.0),
        (132, 2, "2023-03-07", 140.0),
    ];

    let mut submissions = Vec::with_capacity(rows.len());
    for (learner_id, assignment_id, submitted_at, score) in rows {
        submissions.push(Submission {
            learner_id,
            assignment_id,
            submission: SubmissionDetail {
                submitted_at: parse_instant(submitted_at).context("invalid submission date")?,
                score,
            },
        });
    }

    Ok(submissions)
}

pub fn write_samples(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let course = sample_course();
    let group = sample_group()?;
    let submissions = sample_submissions()?;

    std::fs::write(
        dir.join("course.json"),
        serde_json::to_string_pretty(&course)?,
    )?;
    std::fs::write(
        dir.join("group.json"),
        serde_json::to_string_pretty(&group)?,
    )?;
    std::fs::write(
        dir.join("submissions.json"),
        serde_json::to_string_pretty(&submissions)?,
    )?;

    let mut writer = csv::Writer::from_path(dir.join("submissions.csv"))?;
    writer.write_record(["learner_id", "assignment_id", "submitted_at", "score"])?;
    for entry in &submissions {
        writer.write_record([
            entry.learner_id.to_string(),
            entry.assignment_id.to_string(),
            entry.submission.submitted_at.to_rfc3339(),
            entry.submission.score.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rows_that_fail_to_parse_are_skipped() {
        let raw = r#"[
            {"learner_id": 125, "assignment_id": 1,
             "submission": {"submitted_at": "2023-01-25", "score": 47}},
            {"learner_id": 132, "assignment_id": 1,
             "submission": {"submitted_at": "2023-01-24", "score": "not a number"}},
            {"learner_id": 140, "assignment_id": 2,
             "submission": {"submitted_at": "never", "score": 10}}
        ]"#;

        let (submissions, skipped) = parse_submissions_json(raw).unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].learner_id, 125);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn non_array_submissions_input_is_an_error() {
        assert!(parse_submissions_json(r#"{"learner_id": 125}"#).is_err());
    }

    #[test]
    fn csv_rows_that_fail_to_parse_are_skipped() {
        let raw = "\
learner_id,assignment_id,submitted_at,score
125,1,2023-01-25,47
132,1,2023-01-24,abc
140,2,not-a-date,10
141,2,2023-02-12,120
";
        let reader = csv::Reader::from_reader(raw.as_bytes());
        let (submissions, skipped) = parse_submissions_csv(reader).unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(skipped, 2);
        assert_eq!(submissions[1].learner_id, 141);
    }

    #[test]
    fn sample_group_belongs_to_sample_course() {
        let course = sample_course();
        let group = sample_group().unwrap();
        assert_eq!(group.course_id, course.id);
        assert!(group.assignments.iter().all(|a| a.due_at.is_some()));
    }

    #[test]
    fn sample_submissions_round_trip_through_json() {
        let submissions = sample_submissions().unwrap();
        let raw = serde_json::to_string(&submissions).unwrap();
        let (parsed, skipped) = parse_submissions_json(&raw).unwrap();
        assert_eq!(parsed.len(), submissions.len());
        assert_eq!(skipped, 0);
    }
}
