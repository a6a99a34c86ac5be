use chrono::{NaiveDate, NaiveTime};
use teloxide::utils::command::BotCommands;
use uiu_study_bot::bot::commands::calendar::reminder_hint;
use uiu_study_bot::bot::commands::cgpa::parse_cgpa_args;
use uiu_study_bot::bot::commands::codeshare::{parse_codeshare_args, CodeshareArgs};
use uiu_study_bot::bot::commands::gpapredict::{format_outlook, parse_gpapredict_args};
use uiu_study_bot::bot::commands::progress::{parse_progress_args, ProgressArgs};
use uiu_study_bot::bot::commands::peers::parse_match_args;
use uiu_study_bot::bot::commands::profile::{parse_profile_args, ProfileArgs};
use uiu_study_bot::bot::commands::reminders::{parse_reminder_args, ReminderArgs};
use uiu_study_bot::bot::commands::ride::{parse_ride_args, RideArgs};
use uiu_study_bot::bot::commands::study::{parse_study_args, StudyArgs};
use uiu_study_bot::bot::commands::studyplan::parse_studyplan_args;
use uiu_study_bot::bot::commands::Command;
use uiu_study_bot::database::models::{CalendarEvent, Recurrence};
use uiu_study_bot::error::BotError;
use uiu_study_bot::utils::academics::{predict_gpa, GpaOutlook};

#[cfg(test)]
mod command_parsing_tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    #[test]
    fn test_simple_commands_parse() {
        assert_eq!(Command::parse("/help", "testbot").unwrap(), Command::Help);
        assert_eq!(Command::parse("/start", "testbot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/calendar", "testbot").unwrap(), Command::Calendar);
        assert_eq!(
            Command::parse("/gpapredict 3.5 3.8", "testbot").unwrap(),
            Command::Gpapredict("3.5 3.8".to_string())
        );
        assert_eq!(
            Command::parse("/progress", "testbot").unwrap(),
            Command::Progress(String::new())
        );
        assert_eq!(
            Command::parse("/codeshare list rust", "testbot").unwrap(),
            Command::Codeshare("list rust".to_string())
        );
    }

    #[test]
    fn test_commands_keep_their_arguments() {
        assert_eq!(
            Command::parse("/study find CSE321", "testbot").unwrap(),
            Command::Study("find CSE321".to_string())
        );
        assert_eq!(
            Command::parse("/match cse321 A", "testbot").unwrap(),
            Command::Match("cse321 A".to_string())
        );
        assert_eq!(
            Command::parse("/ride share Dhanmondi UIU 08:00", "testbot").unwrap(),
            Command::Ride("share Dhanmondi UIU 08:00".to_string())
        );
    }

    #[test]
    fn test_command_with_bot_mention() {
        assert_eq!(
            Command::parse("/study@testbot find CSE321", "testbot").unwrap(),
            Command::Study("find CSE321".to_string())
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Command::parse("/schedule", "testbot").is_err());
    }

    #[test]
    fn test_study_find_normalizes_course() {
        let StudyArgs::Find(query) = parse_study_args("find cse 321").unwrap();
        assert_eq!(query.course, "CSE321");
        assert_eq!(query.section, None);
    }

    #[test]
    fn test_study_requires_find_and_course() {
        assert!(matches!(parse_study_args(""), Err(BotError::Validation(_))));
        assert!(matches!(parse_study_args("find"), Err(BotError::Validation(_))));
        assert!(matches!(parse_study_args("search CSE321"), Err(BotError::Validation(_))));
        assert!(matches!(parse_study_args("find 321"), Err(BotError::Validation(_))));
    }

    #[test]
    fn test_match_takes_course_and_section() {
        let query = parse_match_args("cse321 a").unwrap();
        assert_eq!(query.course, "CSE321");
        assert_eq!(query.section.as_deref(), Some("A"));

        let spaced = parse_match_args("cse 321 A").unwrap();
        assert_eq!(spaced.course, "CSE321");

        assert!(parse_match_args("CSE321").is_err());
        assert!(parse_match_args("").is_err());
    }

    #[test]
    fn test_ride_share_grammar() {
        let RideArgs::Share(query) = parse_ride_args("share \"Mirpur 10\" UIU 8:05").unwrap() else {
            panic!("expected share");
        };
        assert_eq!(query.from, "Mirpur 10");
        assert_eq!(query.to, "UIU");
        assert_eq!(query.time, NaiveTime::from_hms_opt(8, 5, 0).unwrap());

        assert_eq!(parse_ride_args("status").unwrap(), RideArgs::Status);
        assert_eq!(parse_ride_args("CANCEL").unwrap(), RideArgs::Cancel);
    }

    #[test]
    fn test_ride_share_rejects_bad_input() {
        assert!(parse_ride_args("share Dhanmondi UIU").is_err());
        assert!(parse_ride_args("share Dhanmondi UIU 25:00").is_err());
        assert!(parse_ride_args("share Mirpur 10 UIU 08:00").is_err());
        assert!(parse_ride_args("share \"Mirpur 10 UIU 08:00").is_err());
        assert!(parse_ride_args("").is_err());
    }

    #[test]
    fn test_profile_set_grammar() {
        let args = "set cse 3 CSE321,mat201 cse321:a telegram=@rahim,phone=01700000000 1";
        let ProfileArgs::Set(draft) = parse_profile_args(args).unwrap() else {
            panic!("expected set");
        };

        assert_eq!(draft.department, "CSE");
        assert_eq!(draft.year, 3);
        assert_eq!(draft.courses.get("CSE321"), Some(&Some("A".to_string())));
        assert_eq!(draft.courses.get("MAT201"), Some(&None));
        assert_eq!(draft.contacts.get("telegram").map(String::as_str), Some("@rahim"));
        assert!(draft.ride_opt_in);
    }

    #[test]
    fn test_profile_set_without_sections_or_contacts() {
        let ProfileArgs::Set(draft) = parse_profile_args("set EEE 1 EEE101 - - 0").unwrap() else {
            panic!("expected set");
        };
        assert!(draft.contacts.is_empty());
        assert_eq!(draft.courses.get("EEE101"), Some(&None));
        assert!(!draft.ride_opt_in);
    }

    #[test]
    fn test_profile_set_rejects_bad_input() {
        // Section for a course not in the list
        assert!(parse_profile_args("set CSE 3 CSE321 MAT201:A - 1").is_err());
        // Year out of range
        assert!(parse_profile_args("set CSE 9 CSE321 - - 1").is_err());
        // Opt-in must be 0 or 1
        assert!(parse_profile_args("set CSE 3 CSE321 - - maybe").is_err());
        // Too few arguments
        assert!(parse_profile_args("set CSE 3 CSE321").is_err());
    }

    #[test]
    fn test_profile_subcommands() {
        assert_eq!(parse_profile_args("").unwrap(), ProfileArgs::View);
        assert_eq!(parse_profile_args("view").unwrap(), ProfileArgs::View);
        assert_eq!(parse_profile_args("delete").unwrap(), ProfileArgs::Delete);

        let ProfileArgs::Commute(commute) = parse_profile_args("commute Dhanmondi UIU 7:30").unwrap() else {
            panic!("expected commute");
        };
        assert_eq!(commute.time, "07:30");
        assert!(parse_profile_args("commute Dhanmondi UIU").is_err());
    }

    #[test]
    fn test_reminder_grammar() {
        let parsed = parse_reminder_args("add Submit lab report 2025-10-20 weekly", today()).unwrap();
        assert_eq!(
            parsed,
            ReminderArgs::Add {
                task: "Submit lab report".to_string(),
                deadline: NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
                recurrence: Recurrence::Weekly,
            }
        );

        let ReminderArgs::Add { recurrence, .. } =
            parse_reminder_args("add Quiz 2025-10-02", today()).unwrap()
        else {
            panic!("expected add");
        };
        assert_eq!(recurrence, Recurrence::None);

        assert_eq!(parse_reminder_args("", today()).unwrap(), ReminderArgs::List);
        assert_eq!(parse_reminder_args("clear", today()).unwrap(), ReminderArgs::Clear);
    }

    #[test]
    fn test_reminder_rejects_past_or_missing_deadline() {
        assert!(parse_reminder_args("add Quiz 2025-09-30", today()).is_err());
        assert!(parse_reminder_args("add Quiz", today()).is_err());
        assert!(parse_reminder_args("add 2025-10-20", today()).is_err());
    }

    #[test]
    fn test_cgpa_arguments() {
        let report = parse_cgpa_args("cse321:A cse322:B").unwrap();
        assert!((report.cgpa - 3.5).abs() < 1e-9);
        assert!((report.total_credits - 6.0).abs() < 1e-9);

        assert!(parse_cgpa_args("").is_err());
        assert!(parse_cgpa_args("cse321:F").is_err());
    }

    #[test]
    fn test_studyplan_arguments() {
        let plan = parse_studyplan_args("CSE321,MAT201 12 2025-12-15 CSE321:1,MAT201:2", today()).unwrap();
        assert_eq!(plan.courses, vec!["CSE321".to_string(), "MAT201".to_string()]);
        assert_eq!(plan.hours_per_week, 12);
        assert_eq!(plan.priorities, vec![1, 2]);

        // Missing priority for MAT201
        assert!(parse_studyplan_args("CSE321,MAT201 12 2025-12-15 CSE321:1", today()).is_err());
        // Target date in the past
        assert!(parse_studyplan_args("CSE321 12 2025-09-01 CSE321:1", today()).is_err());
        // Zero hours
        assert!(parse_studyplan_args("CSE321 0 2025-12-15 CSE321:1", today()).is_err());
    }

    #[test]
    fn test_codeshare_add_grammar() {
        let parsed = parse_codeshare_args("add \"Binary search\" CPP,search int lo = 0;").unwrap();
        assert_eq!(
            parsed,
            CodeshareArgs::Add {
                description: "Binary search".to_string(),
                tags: vec!["cpp".to_string(), "search".to_string()],
                code: "int lo = 0;".to_string(),
            }
        );

        assert!(matches!(
            parse_codeshare_args("add Hello - print(1)").unwrap(),
            CodeshareArgs::Add { tags, .. } if tags.is_empty()
        ));
    }

    #[test]
    fn test_codeshare_rejects_bad_input() {
        // No code after the tags
        assert!(matches!(parse_codeshare_args("add Hello rust"), Err(BotError::Validation(_))));
        assert!(parse_codeshare_args("add \"\" rust x").is_err());
        assert!(parse_codeshare_args("add Hello bad_tag! x").is_err());
        assert!(parse_codeshare_args("add Hello a,b,c,d,e,f x").is_err());
        assert!(parse_codeshare_args("list rust python").is_err());
        assert!(parse_codeshare_args("share x").is_err());
    }

    #[test]
    fn test_codeshare_list_grammar() {
        assert_eq!(parse_codeshare_args("").unwrap(), CodeshareArgs::List { tag: None });
        assert_eq!(parse_codeshare_args("list").unwrap(), CodeshareArgs::List { tag: None });
        assert_eq!(
            parse_codeshare_args("list Rust").unwrap(),
            CodeshareArgs::List {
                tag: Some("rust".to_string())
            }
        );
    }

    #[test]
    fn test_progress_grammar() {
        assert_eq!(
            parse_progress_args("").unwrap(),
            ProgressArgs::Show {
                plan_type: "studyplan".to_string()
            }
        );
        assert_eq!(
            parse_progress_args("Python").unwrap(),
            ProgressArgs::Show {
                plan_type: "python".to_string()
            }
        );
        assert_eq!(
            parse_progress_args("done Chapter 3 exercises").unwrap(),
            ProgressArgs::Done {
                step: "Chapter 3 exercises".to_string()
            }
        );

        assert!(parse_progress_args("done").is_err());
        assert!(parse_progress_args("python extra").is_err());
        assert!(parse_progress_args("py$thon").is_err());
    }

    #[test]
    fn test_gpapredict_arguments() {
        let goal = parse_gpapredict_args("3.4 3.5 60 60").unwrap();
        let text = format_outlook(&goal, predict_gpa(&goal));
        assert!(text.contains("3.60"), "{text}");

        let short = parse_gpapredict_args("3.5 3.8").unwrap();
        assert!(matches!(predict_gpa(&short), GpaOutlook::Gap(_)));
        assert!(format_outlook(&short, predict_gpa(&short)).contains("/gpapredict 3.50 3.80"));

        assert!(parse_gpapredict_args("").is_err());
        assert!(parse_gpapredict_args("5 3.8").is_err());
    }

    #[test]
    fn test_calendar_reminder_hint_uses_next_event() {
        let event = CalendarEvent {
            id: 1,
            name: "Final exams".to_string(),
            event_date: "2025-06-01".to_string(),
            details: String::new(),
        };
        assert!(reminder_hint(Some(&event)).contains("/reminders add Final exams 2025-06-01"));
        assert!(reminder_hint(None).contains("/reminders add"));
    }
}
