use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::grade;
use crate::models::{
    AssignmentGroup, AssignmentSummary, Course, LateSubmission, LearnerRecord, Submission,
};

pub fn summarize_assignments(
    group: &AssignmentGroup,
    submissions: &[Submission],
) -> Vec<AssignmentSummary> {
    let mut summaries = Vec::with_capacity(group.assignments.len());

    for assignment in &group.assignments {
        let mut submission_count = 0usize;
        let mut scored_count = 0usize;
        let mut total_fraction = 0.0;
        let scoreable = grade::is_scoreable(assignment);

        for entry in submissions.iter().filter(|s| s.assignment_id == assignment.id) {
            submission_count += 1;
            if !scoreable {
                continue;
            }
            if let Some(fraction) =
                grade::score_fraction(entry.submission.score, assignment.points_possible)
            {
                scored_count += 1;
                total_fraction += fraction;
            }
        }

        summaries.push(AssignmentSummary {
            assignment_id: assignment.id,
            name: assignment.name.clone(),
            points_possible: assignment.points_possible,
            due_at: assignment.due_at,
            submission_count,
            avg_percentage: if scored_count == 0 {
                0.0
            } else {
                total_fraction / scored_count as f64 * 100.0
            },
        });
    }

    summaries
}

pub fn collect_late_submissions(
    group: &AssignmentGroup,
    submissions: &[Submission],
) -> Vec<LateSubmission> {
    let mut late = Vec::new();

    for entry in submissions {
        let Some(assignment) = group.assignments.iter().find(|a| a.id == entry.assignment_id)
        else {
            continue;
        };
        let Some(due_at) = assignment.due_at else {
            continue;
        };
        if grade::is_late(assignment, entry.submission.submitted_at) {
            late.push(LateSubmission {
                learner_id: entry.learner_id,
                assignment_name: assignment.name.clone(),
                submitted_at: entry.submission.submitted_at,
                due_at,
            });
        }
    }

    late.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    late
}

pub fn build_report(
    course: &Course,
    group: &AssignmentGroup,
    submissions: &[Submission],
    records: &[LearnerRecord],
    as_of: DateTime<Utc>,
) -> String {
    let summaries = summarize_assignments(group, submissions);
    let late = collect_late_submissions(group, submissions);

    let mut output = String::new();

    let _ = writeln!(output, "# Course Grade Report");
    let _ = writeln!(
        output,
        "Generated for {} / {} (group weight {}), evaluated at {}",
        course.name,
        group.name,
        group.group_weight,
        as_of.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Assignment Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No assignments in this group.");
    } else {
        for summary in summaries.iter() {
            let due_label = match summary.due_at {
                Some(due_at) => format!("due {}", due_at.format("%Y-%m-%d")),
                None => "no due date".to_string(),
            };
            let _ = writeln!(
                output,
                "- {} (assignment {}): {} submissions (avg score {:.1}%), {} pts, {}",
                summary.name,
                summary.assignment_id,
                summary.submission_count,
                summary.avg_percentage,
                summary.points_possible,
                due_label
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Learner Averages");

    if records.is_empty() {
        let _ = writeln!(output, "No learners with scoreable submissions.");
    } else {
        let mut ranked: Vec<&LearnerRecord> = records.iter().collect();
        ranked.sort_by(|a, b| b.avg.partial_cmp(&a.avg).unwrap_or(std::cmp::Ordering::Equal));
        for record in ranked {
            let _ = writeln!(
                output,
                "- learner {}: weighted average {:.2}% across {} scored assignments",
                record.id,
                record.avg,
                record.scores.len()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Late Submissions");

    if late.is_empty() {
        let _ = writeln!(output, "No late submissions.");
    } else {
        for entry in late.iter() {
            let _ = writeln!(
                output,
                "- learner {} submitted {} on {} (was due {})",
                entry.learner_id,
                entry.assignment_name,
                entry.submitted_at.format("%Y-%m-%d"),
                entry.due_at.format("%Y-%m-%d")
            );
        }
    }

    output
}
