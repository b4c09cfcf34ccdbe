use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::KeyEvent;
use crossterm::terminal;
use konami::input::CrosstermSource;
use konami::{Config, EventKind, Notification, Sequence, Step, Watcher, WatcherBuilder};
use log::info;
use std::io::{Write, stdout};
use std::path::PathBuf;
use std::panic;
use std::time::Duration;

/// Watch the keyboard for a secret key sequence.
#[derive(Parser, Debug)]
#[command(name = "konami", version)]
#[command(about = "Watch the keyboard for a secret key sequence")]
struct Args {
    /// TOML file with `timeout_ms` and `sequence`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds allowed between two keys
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Sequence in key notation, e.g. "<ArrowUp><ArrowUp>ba"
    #[arg(short, long)]
    sequence: Option<Sequence>,

    /// Exit after the first success
    #[arg(long)]
    once: bool,

    /// Print notifications as JSON lines
    #[arg(long)]
    json: bool,

    /// Log file (the terminal is in raw mode while watching)
    #[arg(long, default_value = "/tmp/konami.log")]
    log: PathBuf,

    /// Log matcher decisions
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Enable better panic messages
    better_panic::install();

    let args = Args::parse();
    setup_log(&args)?;

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let mut builder = WatcherBuilder::new().with_config(config);
    if let Some(sequence) = args.sequence.clone() {
        builder = builder.with_sequence(sequence);
    }
    if let Some(timeout) = args.timeout {
        builder = builder.with_timeout(Duration::from_millis(timeout));
    }
    let mut watcher = builder.build(CrosstermSource::new());

    for kind in EventKind::ALL {
        let json = args.json;
        watcher.on(kind, move |notification| print_notification(notification, json));
    }

    // Leave raw mode before the panic message is printed
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        _ = terminal::disable_raw_mode();
        default_hook(info);
    }));

    println!(
        "Type {} within {}ms per key (Esc or Ctrl-C to quit)",
        watcher.matcher().sequence(),
        watcher.matcher().timeout().as_millis()
    );
    info!("watching for {}", watcher.matcher().sequence());

    watcher.start()?;
    let result = watch(&mut watcher, args.once).await;

    // Always restore the terminal, even if watching failed
    if let Err(e) = watcher.stop() {
        eprintln!("Error restoring terminal: {}", e);
    }

    result
}

fn setup_log(args: &Args) -> Result<()> {
    use env_logger::{Builder, Env, Target};
    use std::fs::File;

    let file = File::create(&args.log)
        .with_context(|| format!("Failed to create log file {}", args.log.display()))?;
    let level = if args.verbose { "trace" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}

async fn watch(watcher: &mut Watcher<CrosstermSource>, once: bool) -> Result<()> {
    loop {
        match watcher.step().await? {
            Step::Key(Some(result)) if once && result.completed => return Ok(()),
            Step::Closed | Step::Stopped => return Ok(()),
            _ => {}
        }
    }
}

fn print_notification(notification: &Notification<KeyEvent>, json: bool) {
    let line = if json {
        match serde_json::to_string(notification) {
            Ok(line) => line,
            Err(e) => format!("{{\"error\":\"{e}\"}}"),
        }
    } else {
        notification.to_string()
    };

    // Raw mode does not translate \n
    let mut stdout = stdout();
    _ = write!(stdout, "{line}\r\n");
    _ = stdout.flush();
}
