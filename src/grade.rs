use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Assignment, AssignmentGroup, Course, LearnerRecord, Submission};

#[derive(Debug, Error)]
#[error(
    "invalid input: assignment group {group_id} belongs to course {group_course_id}, not course {course_id}"
)]
pub struct InvalidRelationshipError {
    pub group_id: u64,
    pub group_course_id: u64,
    pub course_id: u64,
}

pub fn validate_relationship(
    course: &Course,
    group: &AssignmentGroup,
) -> Result<(), InvalidRelationshipError> {
    if group.course_id != course.id {
        return Err(InvalidRelationshipError {
            group_id: group.id,
            group_course_id: group.course_id,
            course_id: course.id,
        });
    }
    Ok(())
}

/// Rolls submissions up into one record per learner: a percentage per due
/// assignment plus a points-weighted average. Learners whose submissions carry
/// no average weight are dropped. `as_of` is the evaluation instant; callers
/// snapshot it once so every due-date comparison agrees.
pub fn compute_learner_data(
    course: &Course,
    group: &AssignmentGroup,
    submissions: &[Submission],
    as_of: DateTime<Utc>,
) -> Result<Vec<LearnerRecord>, InvalidRelationshipError> {
    validate_relationship(course, group)?;

    let assignments: HashMap<u64, &Assignment> =
        group.assignments.iter().map(|a| (a.id, a)).collect();

    let mut encounter_order: Vec<u64> = Vec::new();
    let mut score_maps: HashMap<u64, BTreeMap<u64, f64>> = HashMap::new();

    for entry in submissions {
        let Some(assignment) = assignments.get(&entry.assignment_id) else {
            continue;
        };
        if !is_scoreable(assignment) {
            continue;
        }
        let Some(fraction) = score_fraction(entry.submission.score, assignment.points_possible)
        else {
            continue;
        };

        let scores = score_maps.entry(entry.learner_id).or_insert_with(|| {
            encounter_order.push(entry.learner_id);
            BTreeMap::new()
        });

        // An assignment that is not yet due leaves no key at all.
        if is_due(assignment, as_of) {
            scores.insert(assignment.id, fraction * 100.0);
        }
    }

    let mut records = Vec::with_capacity(encounter_order.len());
    for learner_id in encounter_order {
        let Some(scores) = score_maps.remove(&learner_id) else {
            continue;
        };
        let Some(avg) = weighted_average(group, submissions, learner_id, as_of) else {
            continue;
        };
        records.push(LearnerRecord {
            id: learner_id,
            avg,
            scores,
        });
    }

    Ok(records)
}

// Late submissions keep their pass-one percentage but earn no weight here;
// only on-time work (submitted_at <= due_at) counts toward the average.
fn weighted_average(
    group: &AssignmentGroup,
    submissions: &[Submission],
    learner_id: u64,
    as_of: DateTime<Utc>,
) -> Option<f64> {
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    for assignment in &group.assignments {
        if !is_scoreable(assignment) || !is_due(assignment, as_of) {
            continue;
        }
        let Some(entry) = submissions
            .iter()
            .find(|s| s.learner_id == learner_id && s.assignment_id == assignment.id)
        else {
            continue;
        };
        if !entry.submission.score.is_finite() {
            continue;
        }
        if is_late(assignment, entry.submission.submitted_at) {
            continue;
        }
        total_score += entry.submission.score;
        total_weight += assignment.points_possible;
    }

    if total_weight == 0.0 {
        return None;
    }
    let avg = total_score / total_weight * 100.0;
    avg.is_finite().then_some(avg)
}

pub(crate) fn is_scoreable(assignment: &Assignment) -> bool {
    assignment.points_possible.is_finite() && assignment.points_possible > 0.0
}

fn is_due(assignment: &Assignment, as_of: DateTime<Utc>) -> bool {
    match assignment.due_at {
        None => true,
        Some(due_at) => due_at <= as_of,
    }
}

pub(crate) fn is_late(assignment: &Assignment, submitted_at: DateTime<Utc>) -> bool {
    match assignment.due_at {
        None => false,
        Some(due_at) => submitted_at > due_at,
    }
}

pub(crate) fn score_fraction(score: f64, points_possible: f64) -> Option<f64> {
    if !score.is_finite() {
        return None;
    }
    let fraction = score / points_possible;
    fraction.is_finite().then_some(fraction)
}
