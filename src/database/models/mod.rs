pub mod calendar;
pub mod cooldown;
pub mod notification;
pub mod profile;
pub mod progress;
pub mod reminder;
pub mod ride_request;
pub mod snippet;

pub use calendar::*;
pub use cooldown::*;
pub use notification::*;
pub use profile::*;
pub use progress::*;
pub use reminder::*;
pub use ride_request::*;
pub use snippet::*;
