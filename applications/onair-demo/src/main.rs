/// OnAir Demo - scripted playback session against a simulated engine
use anyhow::Context;
use clap::Parser;
use onair_core::{format_clock, ContentType, MediaItem, MediaKind};
use onair_engine::{EngineStateCode, SimulatedHost};
use onair_sync::{PlaybackClient, PlaybackService, PlayerConfig, PlayerSnapshot};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "onair-demo")]
#[command(about = "Drive the OnAir playback controller against a simulated engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ONAIR_CONFIG")]
    config: Option<PathBuf>,

    /// Number of readiness probes the simulated engine fails
    #[arg(long, default_value_t = 0)]
    fail_probes: u32,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onair_sync=info,onair_engine=info,onair_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let settle = Duration::from_millis(
        config.engine.settle_delay_ms + config.sync.autoplay_delay_ms + 100,
    );
    let poll = config.sync.poll_interval() + Duration::from_millis(100);

    let host = SimulatedHost::new();
    host.update(|s| {
        s.failing_probes = cli.fail_probes;
        s.duration = 240.0;
    });

    let (client, service) = PlaybackService::spawn(config.clone(), Box::new(host.clone()));

    for item in lineup() {
        client.add_to_playlist(item)?;
    }
    client.play_at_index(0)?;

    // Failed probes back off before the engine comes up degraded
    let probe_wait = config.engine.retry_backoff_ms * u64::from(cli.fail_probes);
    tokio::time::sleep(settle + Duration::from_millis(probe_wait)).await;
    report("Started", &client.settled_snapshot().await?);

    host.update(|s| s.position = 73.5);
    tokio::time::sleep(poll).await;
    report("Polled", &client.settled_snapshot().await?);

    client.toggle_mute()?;
    client.set_volume(55)?;
    tokio::time::sleep(settle).await;
    let engine = host.state();
    info!(
        muted = engine.muted,
        volume = engine.volume,
        "Engine after mute and volume changes"
    );

    info!("Simulating end of track");
    host.emit_state(EngineStateCode::Ended);
    tokio::time::sleep(settle).await;
    report("Advanced", &client.settled_snapshot().await?);

    // Within the threshold, previous walks back through history
    client.play_previous()?;
    tokio::time::sleep(settle).await;
    report("Previous", &client.settled_snapshot().await?);

    // Speech has no embed; the engine is torn down
    client.play_at_index(2)?;
    let snapshot = client.settled_snapshot().await?;
    report("Speech", &snapshot);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    client.shutdown()?;
    service.await.context("Playback service panicked")?;

    let engine = host.state();
    info!(
        mounts = engine.mounts,
        unmounts = engine.unmounts,
        commands = engine.commands.len(),
        "Demo finished"
    );
    Ok(())
}

fn lineup() -> Vec<MediaItem> {
    vec![
        MediaItem::new("101", ContentType::Station, "night-drive", "Night Drive")
            .with_source_url("https://youtu.be/nd-0001")
            .with_location("Ljubljana"),
        MediaItem::new("102", ContentType::Station, "harbour-lights", "Harbour Lights")
            .with_source_url("https://www.youtube.com/watch?v=hl-0002")
            .with_city("Koper"),
        MediaItem::new("201", ContentType::Article, "morning-briefing", "Morning Briefing")
            .with_media_kind(MediaKind::SynthesizedSpeech),
    ]
}

fn report(stage: &str, snapshot: &PlayerSnapshot) {
    let session = &snapshot.session;
    let title = session
        .current
        .as_ref()
        .map_or("<nothing>", |item| item.title.as_str());

    info!(
        stage,
        title,
        playing = session.is_playing,
        muted = session.is_muted,
        volume = session.volume,
        elapsed = %format_clock(session.elapsed_seconds),
        engine = ?snapshot.engine.state,
        index = ?session.current_index,
        "Player state"
    );
}
