pub mod academics;
pub mod datetime;
pub mod feedback;
pub mod logging;
pub mod markdown;
pub mod validation;
