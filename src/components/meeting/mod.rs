pub mod booking;
pub mod slots;

pub use booking::{event_link, parse_attendees, parse_time_selection, MeetingRequest, TimeSelection};
pub use slots::{suggest_slots, Slot, SlotStrategy};
