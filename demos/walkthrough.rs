//! Walks through the app flow: a refused create, login, create, list,
//! detail, delete, logout.
//!
//! Run with: `cargo run --example walkthrough`
//!
//! Set `RUST_LOG=eventboard=debug` to see the store's log output.

use eventboard::commands;
use eventboard::{AppState, EventInput};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let state = AppState::builder().build()?;

    // Creating without a session is refused by the command layer.
    let refused = commands::create_event(
        &state,
        EventInput::new("Music Festival", "2025-04-20", "Austin, TX", "Three days"),
    );
    println!("before login: {}", serde_json::to_string(&refused.unwrap_err())?);

    let session = commands::login(&state, "test@gmail.com", "1234")?;
    println!("session: {}", serde_json::to_string(&session)?);

    let conf = commands::create_event(
        &state,
        EventInput::new(
            "Tech Conference 2025",
            "2025-03-15",
            "San Francisco, CA",
            "Talks on AI and more",
        )
        .with_image("file:///data/conf.jpg"),
    )?;
    let festival = commands::create_event(
        &state,
        EventInput::new("Music Festival", "2025-04-20", "Austin, TX", "Three days"),
    )?;

    for event in commands::list_events(&state) {
        println!("listed: {} | {} | {}", event.title, event.date, event.location);
    }

    let detail = commands::event_detail(&state, &conf.id)?;
    println!("detail: {}", serde_json::to_string_pretty(&detail)?);

    commands::delete_event(&state, &conf.id)?;
    assert_eq!(commands::list_events(&state), vec![festival]);

    let session = commands::logout(&state);
    assert!(!session.is_authenticated());

    println!("all assertions passed");
    Ok(())
}
