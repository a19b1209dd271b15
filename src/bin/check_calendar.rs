use chrono::Utc;
use meeting_scheduler::components::google_calendar::{CalendarService, GoogleCalendarClient, OAuthFlow};
use meeting_scheduler::components::meeting::suggest_slots;
use meeting_scheduler::config::Config;
use meeting_scheduler::error::SchedulerResult;
use std::time::Duration;

/// Authorize in the browser, then print upcoming events and free slots
#[tokio::main]
async fn main() -> miette::Result<()> {
    run().await?;
    Ok(())
}

async fn run() -> SchedulerResult<()> {
    // Load configuration
    let config = Config::load()?;

    let flow = OAuthFlow::new(
        config.credential_source(),
        Duration::from_secs(config.callback_timeout_secs),
    );

    println!("Opening browser for Google Calendar authorization...");
    let token = flow.run().await?;
    println!("Authorization successful!");

    let client = GoogleCalendarClient::from_config(&config)?;
    let now = Utc::now();
    let events = client.upcoming_events(&token, now).await?;

    println!("\nUpcoming events in '{}':", config.calendar_id);
    if events.is_empty() {
        println!("  (none)");
    }
    for event in &events {
        let start = event
            .start
            .date_time
            .as_deref()
            .or(event.start.date.as_deref())
            .unwrap_or("?");
        println!("  {}  {}", start, event.summary.as_deref().unwrap_or("(no title)"));
    }

    let slots = suggest_slots(now, config.zone(), &events, config.slot_strategy);
    println!("\nSuggested slots ({}):", config.timezone);
    if slots.is_empty() {
        println!("  No free slots available today.");
    }
    for slot in &slots {
        println!("  {}", slot);
    }

    Ok(())
}
