mod client;
pub mod credentials;
pub mod models;
pub mod oauth;
pub mod time;
pub mod token;

pub use client::{CalendarService, GoogleCalendarClient};
pub use credentials::{ClientSecret, CredentialSource};
pub use models::{Attendee, CalendarEvent, EventTime, NewEvent};
pub use oauth::{Authorizer, OAuthFlow};
pub use token::AccessToken;
