use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use teloxide::prelude::*;

use crate::bot::commands::progress::STUDY_PLAN;
use crate::bot::handlers::BotContext;
use crate::database::models::StudyProgress;
use crate::error::{with_timeout, BotError, BotResult};
use crate::utils::academics::{allocate_study_hours, StudyPlanInput};
use crate::utils::datetime::{format_date, parse_date};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::{split_args, validate_course_code};

const MAX_HOURS_PER_WEEK: u32 = 100;

pub const USAGE: &str = "/studyplan <courses> <hours/week> <YYYY-MM-DD> <course:priority,...>\n\
Example: /studyplan CSE321,MAT201 12 2025-12-15 CSE321:1,MAT201:2\n\
Priority 1 is the most important.";

/// Parses the plan, rejecting target dates that are not after `today`.
pub fn parse_studyplan_args(input: &str, today: NaiveDate) -> BotResult<StudyPlanInput> {
    let args = split_args(input)?;
    let [courses, hours, target, priorities] = args.as_slice() else {
        return Err(BotError::validation(format!(
            "/studyplan takes 4 arguments, got {}.",
            args.len()
        )));
    };

    let courses = courses
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(validate_course_code)
        .collect::<BotResult<Vec<_>>>()?;
    if courses.is_empty() {
        return Err(BotError::validation("List at least one course."));
    }

    let hours_per_week = match hours.trim().parse::<u32>() {
        Ok(h) if (1..=MAX_HOURS_PER_WEEK).contains(&h) => h,
        _ => {
            return Err(BotError::validation(format!(
                "Hours per week must be a whole number from 1 to {MAX_HOURS_PER_WEEK}."
            )))
        }
    };

    let target_date = parse_date(target).map_err(|e| BotError::validation(e.to_string()))?;
    if target_date <= today {
        return Err(BotError::validation("The target date must be in the future."));
    }

    let mut by_course: HashMap<String, u32> = HashMap::new();
    for pair in priorities.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (course, priority) = pair.split_once(':').ok_or_else(|| {
            BotError::validation(format!("Invalid priority '{pair}'. Use course:priority, e.g. CSE321:1."))
        })?;
        let priority = match priority.trim().parse::<u32>() {
            Ok(p) if p >= 1 => p,
            _ => return Err(BotError::validation(format!("Invalid priority in '{pair}'. Use 1 or more."))),
        };
        by_course.insert(validate_course_code(course)?, priority);
    }

    let priorities = courses
        .iter()
        .map(|course| {
            by_course
                .get(course)
                .copied()
                .ok_or_else(|| BotError::validation(format!("Missing priority for {course}.")))
        })
        .collect::<BotResult<Vec<_>>>()?;

    Ok(StudyPlanInput {
        courses,
        hours_per_week,
        target_date,
        priorities,
    })
}

pub async fn handle_studyplan(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("studyplan", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let today = Utc::now().date_naive();
    let plan = match parse_studyplan_args(&args, today) {
        Ok(plan) => plan,
        Err(e) => {
            feedback.report(&cmd, &e, USAGE).await?;
            return Ok(());
        }
    };

    // Each plan opens a progress row that /progress reports on
    let level = format!("{} until {}", plan.courses.join(", "), plan.target_date.format("%Y-%m-%d"));
    if let Err(e) = with_timeout(
        ctx.config.matching.store_timeout,
        "record study plan",
        StudyProgress::record(&ctx.db.pool, cmd.user_id, STUDY_PLAN, &level),
    )
    .await
    {
        feedback.report(&cmd, &e, USAGE).await?;
        return Ok(());
    }

    let weeks = ((plan.target_date - today).num_days() as f64 / 7.0).ceil().max(1.0);
    let mut text = format!(
        "{}\n{}\n\n",
        bold("📖 Study plan"),
        escape_markdown(&format!(
            "{} hours a week until {} ({} week(s))",
            plan.hours_per_week,
            format_date(&plan.target_date),
            weeks
        ))
    );

    for allocation in allocate_study_hours(&plan) {
        text.push_str(&escape_markdown(&format!(
            "• {} (priority {}): {:.1} h/week, {:.0} h total\n",
            allocation.course,
            allocation.priority,
            allocation.hours,
            allocation.hours * weeks
        )));
    }

    text.push_str(&escape_markdown("\nTrack it with /progress and /progress done <step>."));

    feedback.send_markdown(text).await?;
    log_command_success(cmd.command, &cmd.username, cmd.user_id, None);

    Ok(())
}
