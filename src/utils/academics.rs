//! CGPA, GPA goal and study-plan arithmetic behind `/cgpa`, `/gpapredict`
//! and `/studyplan`.

use chrono::NaiveDate;

use crate::error::{BotError, BotResult};
use crate::utils::validation::validate_course_code;

const DEFAULT_CREDITS: f64 = 3.0;
const MAX_CGPA: f64 = 4.0;
const MAX_PROGRAM_CREDITS: f64 = 300.0;

/// Grade letters accepted by `/cgpa` and their points on the 4.0 scale.
pub const GRADE_POINTS: &[(&str, f64)] = &[
    ("A", 4.0),
    ("A-", 3.7),
    ("B+", 3.3),
    ("B", 3.0),
    ("B-", 2.7),
    ("C+", 2.3),
    ("C", 2.0),
];

pub fn grade_points(grade: &str) -> Option<f64> {
    let grade = grade.trim().to_uppercase();
    GRADE_POINTS
        .iter()
        .find(|(letter, _)| *letter == grade)
        .map(|(_, points)| *points)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeEntry {
    pub course: String,
    pub grade: String,
    pub points: f64,
    pub credits: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CgpaReport {
    pub entries: Vec<GradeEntry>,
    pub total_credits: f64,
    pub cgpa: f64,
}

/// Parses `course:grade[:credits]` arguments.
pub fn parse_grade_entries(args: &[String]) -> BotResult<Vec<GradeEntry>> {
    if args.is_empty() {
        return Err(BotError::validation(
            "Usage: /cgpa course1:grade1 course2:grade2\nExample: /cgpa cse321:A cse322:B+",
        ));
    }

    args.iter()
        .map(|arg| {
            let mut parts = arg.split(':');
            let (Some(course), Some(grade)) = (parts.next(), parts.next()) else {
                return Err(BotError::validation(format!(
                    "Invalid entry '{arg}'. Use course:grade, e.g. cse321:A"
                )));
            };

            let course = validate_course_code(course)?;
            let points = grade_points(grade).ok_or_else(|| {
                BotError::validation(format!(
                    "Invalid grade '{grade}'. Use: A, A-, B+, B, B-, C+, C"
                ))
            })?;

            let credits = match parts.next() {
                None => DEFAULT_CREDITS,
                Some(raw) => match raw.trim().parse::<f64>() {
                    Ok(c) if c > 0.0 && c <= 6.0 => c,
                    _ => {
                        return Err(BotError::validation(format!(
                            "Invalid credits '{raw}' for {course}. Use a number between 0 and 6."
                        )))
                    }
                },
            };

            if parts.next().is_some() {
                return Err(BotError::validation(format!("Too many ':' in '{arg}'.")));
            }

            Ok(GradeEntry {
                course,
                grade: grade.trim().to_uppercase(),
                points,
                credits,
            })
        })
        .collect()
}

/// Credit-weighted grade point average.
pub fn compute_cgpa(entries: Vec<GradeEntry>) -> BotResult<CgpaReport> {
    let total_credits: f64 = entries.iter().map(|e| e.credits).sum();
    if entries.is_empty() || total_credits <= 0.0 {
        return Err(BotError::validation("Provide at least one graded course."));
    }

    let weighted: f64 = entries.iter().map(|e| e.points * e.credits).sum();

    Ok(CgpaReport {
        cgpa: weighted / total_credits,
        total_credits,
        entries,
    })
}

/// Where a student stands and where they want to be on the 4.0 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpaGoal {
    pub current: f64,
    pub target: f64,
    /// Completed and remaining credits, when given.
    pub credits: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpaOutlook {
    /// The current CGPA already meets the target.
    AlreadyMet,
    /// Average grade point needed over the remaining credits.
    Needs(f64),
    /// The remaining credits cannot lift the CGPA that far.
    OutOfReach(f64),
    /// Without credit counts only the distance to the target is known.
    Gap(f64),
}

/// Parses `<current> <target> [<completed credits> <remaining credits>]`.
pub fn parse_gpa_goal(args: &[String]) -> BotResult<GpaGoal> {
    let (current, target, credits) = match args {
        [current, target] => (current, target, None),
        [current, target, completed, remaining] => (current, target, Some((completed, remaining))),
        _ => {
            return Err(BotError::validation(
                "Give your current and target CGPA, optionally followed by completed and remaining credits.",
            ))
        }
    };

    let current = parse_cgpa_value(current, "current CGPA")?;
    let target = parse_cgpa_value(target, "target CGPA")?;

    let credits = match credits {
        None => None,
        Some((completed, remaining)) => {
            let completed = parse_credits(completed, "completed credits")?;
            let remaining = parse_credits(remaining, "remaining credits")?;
            if remaining <= 0.0 {
                return Err(BotError::validation("Remaining credits must be more than 0."));
            }
            Some((completed, remaining))
        }
    };

    Ok(GpaGoal {
        current,
        target,
        credits,
    })
}

fn parse_cgpa_value(raw: &str, label: &str) -> BotResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if (0.0..=MAX_CGPA).contains(&v) => Ok(v),
        _ => Err(BotError::validation(format!(
            "Invalid {label} '{raw}'. Use a number from 0 to 4, e.g. 3.5"
        ))),
    }
}

fn parse_credits(raw: &str, label: &str) -> BotResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if (0.0..=MAX_PROGRAM_CREDITS).contains(&v) => Ok(v),
        _ => Err(BotError::validation(format!(
            "Invalid {label} '{raw}'. Use a number from 0 to {MAX_PROGRAM_CREDITS}."
        ))),
    }
}

/// Grade point average needed over the remaining credits for the overall
/// credit-weighted CGPA to reach the target.
pub fn predict_gpa(goal: &GpaGoal) -> GpaOutlook {
    let Some((completed, remaining)) = goal.credits else {
        return if goal.target <= goal.current {
            GpaOutlook::AlreadyMet
        } else {
            GpaOutlook::Gap(goal.target - goal.current)
        };
    };

    let required = (goal.target * (completed + remaining) - goal.current * completed) / remaining;
    if required <= 0.0 {
        GpaOutlook::AlreadyMet
    } else if required > MAX_CGPA {
        GpaOutlook::OutOfReach(required)
    } else {
        GpaOutlook::Needs(required)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyPlanInput {
    pub courses: Vec<String>,
    pub hours_per_week: u32,
    pub target_date: NaiveDate,
    /// Priority per course, 1 is the most important.
    pub priorities: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyAllocation {
    pub course: String,
    pub priority: u32,
    pub hours: f64,
}

/// Splits the weekly hours across courses, weighting each by
/// `max_priority + 1 - priority` so priority 1 gets the largest share.
pub fn allocate_study_hours(plan: &StudyPlanInput) -> Vec<StudyAllocation> {
    let max_priority = plan.priorities.iter().copied().max().unwrap_or(1);
    let weights: Vec<u32> = plan
        .priorities
        .iter()
        .map(|p| max_priority + 1 - p)
        .collect();
    let total_weight: u32 = weights.iter().sum();

    plan.courses
        .iter()
        .zip(plan.priorities.iter().zip(weights.iter()))
        .map(|(course, (priority, weight))| StudyAllocation {
            course: course.clone(),
            priority: *priority,
            hours: if total_weight == 0 {
                0.0
            } else {
                f64::from(plan.hours_per_week) * f64::from(*weight) / f64::from(total_weight)
            },
        })
        .collect()
}
