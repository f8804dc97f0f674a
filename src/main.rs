use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reflex::drivers::sim::{ChannelLink, RecordingLocomotion, ScriptedCamera, ScriptedClassifier, TimelineDistance};
use reflex::kernel::event::Disposition;
use reflex::{Controller, Drivers, ReflexConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Run the reactive controller against simulated drivers.
///
/// Type `start` or `stop` on stdin; end input (Ctrl+D) to disconnect.
#[derive(Debug, Parser)]
#[command(name = "reflex", version)]
struct Args {
    /// JSON file overriding the default tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Distance the simulated sensor reports while an obstacle is ahead.
    #[arg(long, default_value_t = 180.0)]
    obstacle_mm: f64,

    /// Seconds between simulated obstacles.
    #[arg(long, default_value_t = 6)]
    obstacle_every_s: usize,

    /// One simulated face every N frames. Zero never sees a face.
    #[arg(long, default_value_t = 0)]
    faces_every: usize,

    /// Pause between vision ticks, overriding the config.
    #[arg(long)]
    frame_interval_ms: Option<u64>,

    #[arg(long, default_value_t = 320)]
    width: u32,

    #[arg(long, default_value_t = 240)]
    height: u32,
}

fn simulated_drivers(args: &Args) -> (Drivers, tokio::sync::mpsc::UnboundedReceiver<String>) {
    let mut samples = vec![Some(1500.0); args.obstacle_every_s.max(1)];
    samples.push(Some(args.obstacle_mm));
    let distance = TimelineDistance::cycling(samples, Duration::from_secs(1));

    let classifier = if args.faces_every == 0 {
        ScriptedClassifier::blind()
    } else {
        ScriptedClassifier::every(args.faces_every)
    };

    let (link, frames) = ChannelLink::new();
    let drivers = Drivers {
        locomotion: Arc::new(RecordingLocomotion::new()),
        distance: Arc::new(distance),
        camera: Arc::new(ScriptedCamera::new(args.width, args.height)),
        classifier: Arc::new(classifier),
        link: Arc::new(link),
    };
    (drivers, frames)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ReflexConfig::from_file(path)?,
        None => ReflexConfig::default(),
    };
    if let Some(ms) = args.frame_interval_ms {
        config.vision_interval_ms = ms;
    }

    let (drivers, mut frames) = simulated_drivers(&args);
    let mut controller = Controller::new(drivers, config);

    tracing::info!("Connecting simulated robot...");
    controller.on_connect().await;

    // Stand-in for the remote client: count what would go over the wire.
    tokio::spawn(async move {
        let mut count: u64 = 0;
        while let Some(frame) = frames.recv().await {
            count += 1;
            tracing::debug!(frame = count, bytes = frame.len(), "Frame out");
        }
    });

    println!("Type 'start' to begin, 'stop' to halt. Ctrl+D disconnects.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    controller.on_recv_string(&line).await;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let disposition = controller.on_disconnect().await;
    controller.on_close().await;
    tracing::info!(telemetry = ?controller.telemetry().snapshot(), "Session summary");

    if disposition == Disposition::Exit {
        drop(controller);
        std::process::exit(0);
    }
    Ok(())
}
