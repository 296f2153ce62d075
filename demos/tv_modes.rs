//! Demo: query and switch TV output modes on a simulated output
//!
//! Mirrors the board's TV service command line: show status, list the
//! modes of a timing group, switch to an explicit or preferred mode,
//! power the output down.

use std::time::Duration;

use argh::FromArgs;

use vc_display::hal::FakeVideoCore;
use vc_display::{DisplayHost, ModeGroup, OutputService};

/// TV output mode control (simulated hardware).
#[derive(FromArgs, Debug)]
struct TopLevelArgs {
    /// print machine-readable JSON instead of display strings
    #[argh(switch)]
    json: bool,

    #[argh(subcommand)]
    command: ModeCommand,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum ModeCommand {
    Status(StatusCmd),
    Modes(ModesCmd),
    Preferred(PreferredCmd),
    Set(SetCmd),
    Prefer(PreferCmd),
    Off(OffCmd),
}

/// show the active output mode and power state
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "status")]
struct StatusCmd {}

/// list supported modes for a timing group
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "modes")]
struct ModesCmd {
    /// timing group, CEA or DMT
    #[argh(positional)]
    group: String,
}

/// show the hardware-preferred mode
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "preferred")]
struct PreferredCmd {}

/// switch to an explicit mode and wait for it to settle
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "set")]
struct SetCmd {
    /// timing group, CEA or DMT
    #[argh(positional)]
    group: String,

    /// mode code within the group
    #[argh(positional)]
    code: u16,
}

/// switch back to the preferred mode
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "prefer")]
struct PreferCmd {}

/// power the output down
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "off")]
struct OffCmd {}

const SETTLE_WAIT: Duration = Duration::from_secs(2);

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: TopLevelArgs = argh::from_env();
    let host = DisplayHost::new(FakeVideoCore::new());
    let service = host.output_service();

    match args.command {
        ModeCommand::Status(_) => print_status(&service, args.json)?,
        ModeCommand::Modes(cmd) => {
            let group: ModeGroup = cmd.group.parse()?;
            let catalog = service.modes(group)?;
            if args.json {
                let modes: Vec<_> = catalog.iter().collect();
                println!("{}", serde_json::to_string_pretty(&modes)?);
            } else {
                for mode in &catalog {
                    println!("{}", mode);
                }
            }
        }
        ModeCommand::Preferred(_) => {
            let mode = service.preferred_mode()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&mode)?);
            } else {
                println!("{}", mode);
            }
        }
        ModeCommand::Set(cmd) => {
            let group: ModeGroup = cmd.group.parse()?;
            service.set_explicit(group, cmd.code)?;
            if service.wait_for_mode(group, cmd.code, SETTLE_WAIT)? {
                print_status(&service, args.json)?;
            } else {
                eprintln!(
                    "mode not active after {:?}; the output may still be settling",
                    SETTLE_WAIT
                );
            }
        }
        ModeCommand::Prefer(_) => {
            let mode = service.preferred_mode()?;
            service.set_preferred()?;
            service.wait_for_mode(mode.group, mode.code, SETTLE_WAIT)?;
            print_status(&service, args.json)?;
        }
        ModeCommand::Off(_) => {
            service.power_off()?;
            print_status(&service, args.json)?;
        }
    }
    Ok(())
}

fn print_status(service: &OutputService, json: bool) -> anyhow::Result<()> {
    let status = service.status()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", status);
    }
    Ok(())
}
