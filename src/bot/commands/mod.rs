pub mod calendar;
pub mod cgpa;
pub mod codeshare;
pub mod gpapredict;
pub mod peers;
pub mod profile;
pub mod progress;
pub mod reminders;
pub mod ride;
pub mod study;
pub mod studyplan;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "UIU Study Bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Find study partners: /study find <course>")]
    Study(String),
    #[command(description = "Find classmates in your section: /match <course> <section>")]
    Match(String),
    #[command(description = "Share a ride: /ride share <from> <to> <HH:MM>, /ride status, /ride cancel")]
    Ride(String),
    #[command(description = "View or edit your profile: /profile [view|set|commute|delete]")]
    Profile(String),
    #[command(description = "Compute your CGPA: /cgpa course:grade[:credits] ...")]
    Cgpa(String),
    #[command(description = "Estimate the GPA you need: /gpapredict <current> <target> [<completed credits> <remaining credits>]")]
    Gpapredict(String),
    #[command(description = "Plan study hours: /studyplan <courses> <hours/week> <YYYY-MM-DD> <course:priority,...>")]
    Studyplan(String),
    #[command(description = "Track study plan progress: /progress [type], /progress done <step>")]
    Progress(String),
    #[command(description = "Manage reminders: /reminders add <task> <YYYY-MM-DD> [daily|weekly], list, clear")]
    Reminders(String),
    #[command(description = "Show upcoming academic calendar events")]
    Calendar,
    #[command(description = "Save and list code snippets: /codeshare add <description> <tags> <code>, /codeshare list [tag]")]
    Codeshare(String),
}

/// First argument lowercased, for subcommand dispatch.
pub(crate) fn subcommand(args: &[String]) -> Option<String> {
    args.first().map(|s| s.to_lowercase())
}
