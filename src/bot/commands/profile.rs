use std::collections::BTreeMap;
use teloxide::prelude::*;

use super::subcommand;
use crate::bot::handlers::BotContext;
use crate::database::models::*;
use crate::error::{with_timeout, BotError, BotResult};
use crate::utils::datetime::{format_clock_time, parse_clock_time};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::{
    parse_contacts, parse_opt_in, split_args, validate_course_code, validate_department,
    validate_location, validate_section, validate_year,
};

const MAX_COURSES: usize = 10;

pub const USAGE: &str = "/profile set <dept> <year> <courses> <course:section,...> <contacts> <ride 0|1>\n\
Example: /profile set CSE 3 CSE321,MAT201 CSE321:A,MAT201:B telegram=@you 1\n\
Use - for no sections or no contacts.\n\
Also: /profile view, /profile commute <from> <to> <HH:MM>, /profile delete";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileArgs {
    View,
    Set(ProfileDraft),
    Commute(Commute),
    Delete,
}

pub fn parse_profile_args(input: &str) -> BotResult<ProfileArgs> {
    let args = split_args(input)?;

    match subcommand(&args).as_deref() {
        None | Some("view") if args.len() <= 1 => Ok(ProfileArgs::View),
        Some("set") => parse_set(&args[1..]).map(ProfileArgs::Set),
        Some("commute") => parse_commute(&args[1..]).map(ProfileArgs::Commute),
        Some("delete") if args.len() == 1 => Ok(ProfileArgs::Delete),
        _ => Err(BotError::validation(format!(
            "Unknown /profile arguments '{}'.",
            input.trim()
        ))),
    }
}

fn parse_set(args: &[String]) -> BotResult<ProfileDraft> {
    let [department, year, courses, sections, contacts, opt_in] = args else {
        return Err(BotError::validation(format!(
            "/profile set takes 6 arguments, got {}.",
            args.len()
        )));
    };

    let mut course_map: BTreeMap<String, Option<String>> = BTreeMap::new();
    for course in courses.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        course_map.insert(validate_course_code(course)?, None);
    }
    if course_map.is_empty() {
        return Err(BotError::validation("List at least one course, e.g. CSE321,MAT201."));
    }
    if course_map.len() > MAX_COURSES {
        return Err(BotError::validation(format!(
            "At most {MAX_COURSES} courses are allowed."
        )));
    }

    if sections.trim() != "-" {
        for pair in sections.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (course, section) = pair.split_once(':').ok_or_else(|| {
                BotError::validation(format!("Invalid section '{pair}'. Use course:section, e.g. CSE321:A."))
            })?;
            let course = validate_course_code(course)?;
            let slot = course_map.get_mut(&course).ok_or_else(|| {
                BotError::validation(format!("{course} has a section but is not in your course list."))
            })?;
            *slot = Some(validate_section(section)?);
        }
    }

    Ok(ProfileDraft {
        department: validate_department(department)?,
        year: validate_year(year)?,
        courses: course_map,
        contacts: parse_contacts(contacts)?,
        ride_opt_in: parse_opt_in(opt_in)?,
    })
}

fn parse_commute(args: &[String]) -> BotResult<Commute> {
    let [from, to, time] = args else {
        return Err(BotError::validation(
            "Usage: /profile commute <from> <to> <HH:MM>. Quote places with spaces.",
        ));
    };

    let time = parse_clock_time(time).map_err(|e| BotError::validation(e.to_string()))?;

    Ok(Commute {
        from_location: validate_location(from)?,
        to_location: validate_location(to)?,
        time: format_clock_time(&time),
    })
}

pub async fn handle_profile(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("profile", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let parsed = match parse_profile_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            feedback.report(&cmd, &e, USAGE).await?;
            return Ok(());
        }
    };

    let pool = &ctx.db.pool;
    let timeout = ctx.config.matching.store_timeout;

    let outcome: BotResult<()> = async {
        match parsed {
            ProfileArgs::View => {
                let text = render_profile(ctx, cmd.user_id).await?;
                feedback.send_markdown(text).await.map_err(send_failed)?;
            }
            ProfileArgs::Set(draft) => {
                let profile = with_timeout(
                    timeout,
                    "save profile",
                    Profile::upsert(pool, cmd.user_id, cmd.username(), &draft),
                )
                .await?;
                let message = format!(
                    "Profile saved: {} year {}, {} course(s), ride sharing {}.",
                    profile.department,
                    profile.year,
                    draft.courses.len(),
                    if profile.ride_opt_in { "on" } else { "off" }
                );
                feedback.success(&message).await.map_err(send_failed)?;
            }
            ProfileArgs::Commute(commute) => {
                let updated = with_timeout(
                    timeout,
                    "save commute",
                    Profile::set_commute(pool, cmd.user_id, &commute),
                )
                .await?;
                if !updated {
                    return Err(no_profile());
                }
                let message = format!(
                    "Commute saved: {} → {} at {}.",
                    commute.from_location, commute.to_location, commute.time
                );
                feedback.success(&message).await.map_err(send_failed)?;
            }
            ProfileArgs::Delete => {
                let deleted = with_timeout(timeout, "delete profile", Profile::delete(pool, cmd.user_id)).await?;
                if !deleted {
                    return Err(no_profile());
                }
                feedback
                    .success("Your profile, courses and ride request were deleted.")
                    .await
                    .map_err(send_failed)?;
            }
        }
        Ok(())
    }
    .await;

    match outcome {
        Ok(()) => log_command_success(cmd.command, &cmd.username, cmd.user_id, None),
        Err(e) => {
            feedback.report(&cmd, &e, USAGE).await?;
        }
    }

    Ok(())
}

/// MarkdownV2 summary of a user's profile.
pub async fn render_profile(ctx: &BotContext, user_id: i64) -> BotResult<String> {
    let pool = &ctx.db.pool;
    let timeout = ctx.config.matching.store_timeout;

    let profile = with_timeout(timeout, "load profile", Profile::find(pool, user_id))
        .await?
        .ok_or_else(no_profile)?;
    let courses = with_timeout(timeout, "load courses", Profile::courses(pool, user_id)).await?;

    let mut text = format!(
        "👤 {}\n\n{} {}\n{} {}\n",
        bold(&profile.display_name()),
        bold("Department:"),
        escape_markdown(&profile.department),
        bold("Year:"),
        profile.year
    );

    let course_list = courses
        .iter()
        .map(|c| match &c.section {
            Some(section) => format!("{} ({})", c.course_code, section),
            None => c.course_code.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    text.push_str(&format!("{} {}\n", bold("Courses:"), escape_markdown(&course_list)));

    let contacts = profile.contacts_map();
    if !contacts.is_empty() {
        text.push_str(&format!("{} {}\n", bold("Contacts:"), escape_markdown(&format_contacts(&contacts))));
    }

    text.push_str(&format!(
        "{} {}\n",
        bold("Ride sharing:"),
        if profile.ride_opt_in { "on" } else { "off" }
    ));

    if let Some(commute) = profile.commute() {
        text.push_str(&format!(
            "{} {}\n",
            bold("Commute:"),
            escape_markdown(&format!(
                "{} → {} at {}",
                commute.from_location, commute.to_location, commute.time
            ))
        ));
    }

    Ok(text)
}

pub fn format_contacts(contacts: &BTreeMap<String, String>) -> String {
    contacts
        .iter()
        .map(|(channel, handle)| format!("{channel}: {handle}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn no_profile() -> BotError {
    BotError::not_found("You don't have a profile yet. Create one with /profile set.")
}

pub(crate) fn send_failed(e: teloxide::RequestError) -> BotError {
    BotError::Infrastructure(format!("telegram reply: {e}"))
}
