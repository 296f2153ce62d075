//! Demo: show a still image on a simulated output
//!
//! Usage: cargo run --example show_image <image_file> [lcd|hdmi]
//!
//! Opens a display session against the software videocore double,
//! presents the image for a few seconds and closes the session.

use std::env;
use std::thread;
use std::time::Duration;

use vc_display::hal::FakeVideoCore;
use vc_display::{DisplayHost, DisplayTarget};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_file> [lcd|hdmi]", args[0]);
        eprintln!("Example: {} picture.jpg hdmi", args[0]);
        std::process::exit(1);
    }
    let uri = &args[1];
    let target: DisplayTarget = match args.get(2) {
        Some(name) => name.parse()?,
        None => DisplayTarget::Hdmi,
    };

    let host = DisplayHost::new(FakeVideoCore::new());
    let mut session = host.session_on(target);

    session.open(uri)?;
    println!(
        "Showing '{}' on {} for 3 seconds",
        session.resource_uri(),
        session.target()
    );
    thread::sleep(Duration::from_secs(3));

    session.close();
    println!("Session closed, open = {}", session.is_open());
    Ok(())
}
