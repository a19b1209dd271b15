// Calendar provider integration
pub mod google_calendar;
// Slot suggestion and meeting booking
pub mod meeting;

pub use google_calendar::{CalendarService, GoogleCalendarClient, OAuthFlow};
