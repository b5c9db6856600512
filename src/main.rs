use pianola::messaging::NotificationLevel;
use pianola::{
    CommandRequest, CommandTable, Config, NotificationConsumer, Reply, Stage, VirtualClock,
};
use ringbuf::traits::Consumer;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const USAGE: &str = "usage: pianola <script.json> [--config <path>] [--realtime]";

/// One timed command of a script
#[derive(Debug, Deserialize)]
struct Step {
    /// Seconds from the start of the script
    at: f64,
    #[serde(flatten)]
    request: CommandRequest,
}

struct Options {
    script: PathBuf,
    config: Option<PathBuf>,
    realtime: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut script = None;
    let mut config = None;
    let mut realtime = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--realtime" => realtime = true,
            "-h" | "--help" => return Err(help()),
            other if other.starts_with("--") => {
                return Err(format!("unknown flag {}\n{}", other, USAGE));
            }
            other => {
                if script.replace(PathBuf::from(other)).is_some() {
                    return Err(USAGE.to_string());
                }
            }
        }
    }

    Ok(Options {
        script: script.ok_or(USAGE)?,
        config,
        realtime,
    })
}

fn help() -> String {
    let table = CommandTable::<VirtualClock>::new();
    let instruments = Config::default().instruments.join(", ");
    format!(
        "{}\n\ncommands: {}\ndefault instruments: {}",
        USAGE,
        table.names().join(", "),
        instruments
    )
}

fn print_notifications(rx: &mut NotificationConsumer) {
    while let Some(notification) = rx.try_pop() {
        match notification.level() {
            NotificationLevel::Info => println!("{}", notification),
            NotificationLevel::Warning => println!("{} (see view_errors)", notification),
        }
    }
}

fn run(options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &options.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load(),
    };

    let text = std::fs::read_to_string(&options.script)?;
    let mut steps: Vec<Step> = serde_json::from_str(&text)?;
    steps.sort_by(|a, b| a.at.total_cmp(&b.at));

    let (mut stage, mut rx) = Stage::new(config, VirtualClock::new())?;
    let table = CommandTable::new();

    // Devices are numbered from 1 in creation order
    let highest = steps.iter().map(|s| s.request.device.get()).max().unwrap_or(0);
    for _ in 0..highest {
        stage.add_device();
    }
    log::info!(target: "stage", "{} devices, {} steps", highest, steps.len());
    log::info!(target: "config", "instruments: {}", stage.catalog().names().join(", "));

    for step in &steps {
        let at = step.at.max(stage.now());
        if options.realtime {
            std::thread::sleep(Duration::from_secs_f64(at - stage.now()));
        }
        stage.advance_to(at);
        print_notifications(&mut rx);

        let request = &step.request;
        let label = format!("[{:>8.3}] device {} {}", at, request.device, request.command);
        match table.dispatch(&mut stage, request) {
            Ok(Reply {
                message: Some(message),
            }) => println!("{}: {}", label, message),
            Ok(_) => {}
            Err(e) => println!("{} failed: {}", label, e),
        }
        print_notifications(&mut rx);
    }

    // Let whatever is still playing run out, unless it loops forever
    while let Some(next) = stage.clock().next_fire_time() {
        let looping = stage
            .device_ids()
            .into_iter()
            .filter_map(|id| stage.device(id).ok())
            .any(|d| d.state().is_busy() && d.loop_mode().repeats());
        if looping {
            break;
        }
        if options.realtime {
            std::thread::sleep(Duration::from_secs_f64((next - stage.now()).max(0.0)));
        }
        stage.advance_to(next);
        print_notifications(&mut rx);
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
