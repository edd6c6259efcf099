use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;

use stagehand_core::AppConfig;
use stagehand_engine::scroll::SmoothingConfigExt;
use stagehand_engine::{DeepLink, Engine, EngineEvent, EngineNotice, EngineSnapshot};

/// Frames run after the last scripted event when `--frames` is not given
const TAIL: Duration = Duration::from_secs(2);

pub struct ReplayArgs {
    pub script: PathBuf,
    pub content: Option<PathBuf>,
    pub deep_link: Option<String>,
    pub frames: Option<u32>,
    pub all: bool,
}

/// One timed entry of a replay script
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    /// Offset from the start of the replay
    pub at_ms: u64,
    pub event: EngineEvent,
}

#[derive(Serialize)]
struct FrameLine<'a> {
    kind: &'static str,
    frame: u32,
    elapsed_ms: u64,
    #[serde(flatten)]
    snapshot: &'a EngineSnapshot,
}

#[derive(Serialize)]
struct NoticeLine<'a> {
    kind: &'static str,
    frame: u32,
    notice: &'a EngineNotice,
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    parse_script(&content)
}

pub fn parse_script(content: &str) -> Result<Vec<ScriptStep>> {
    let mut steps: Vec<ScriptStep> = serde_json::from_str(content).context("Invalid replay script")?;
    steps.sort_by_key(|step| step.at_ms);
    Ok(steps)
}

fn default_frames(steps: &[ScriptStep], interval: Duration) -> u32 {
    let last = steps.last().map(|step| step.at_ms).unwrap_or(0);
    let total = Duration::from_millis(last) + TAIL;
    (total.as_millis() / interval.as_millis().max(1)) as u32 + 1
}

fn emit(line: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(line)?);
    Ok(())
}

pub async fn run(config: Arc<AppConfig>, args: ReplayArgs) -> Result<()> {
    let steps = load_script(&args.script)?;
    let source = super::content_source(&config, args.content.as_deref())?;

    let mut engine = Engine::new(Arc::clone(&config), source)?;
    engine.mount();
    if let Some(route) = &args.deep_link {
        let link: DeepLink = route.parse()?;
        engine.direct_entry(link)?;
    }

    let frame_interval = config.smoothing.frame_interval();
    let frames = args
        .frames
        .unwrap_or_else(|| default_frames(&steps, frame_interval));
    tracing::info!(
        steps = steps.len(),
        frames,
        interval_ms = frame_interval.as_millis() as u64,
        "Starting replay"
    );

    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut pending = steps.into_iter().peekable();
    let mut last: Option<EngineSnapshot> = None;
    let start = interval.tick().await;

    for frame in 0..frames {
        let tick = if frame == 0 { start } else { interval.tick().await };
        let elapsed = tick.duration_since(start);

        let mut events = Vec::new();
        while let Some(step) = pending.next_if(|step| Duration::from_millis(step.at_ms) <= elapsed) {
            tracing::debug!(at_ms = step.at_ms, event = ?step.event, "Feeding scripted event");
            events.push(step.event);
        }

        let snapshot = engine.frame(tick.into_std(), events);

        for notice in engine.drain_notices() {
            emit(&NoticeLine {
                kind: "notice",
                frame,
                notice: &notice,
            })?;
        }
        if args.all || last.as_ref() != Some(&snapshot) {
            emit(&FrameLine {
                kind: "frame",
                frame,
                elapsed_ms: elapsed.as_millis() as u64,
                snapshot: &snapshot,
            })?;
        }
        last = Some(snapshot);
    }

    if pending.peek().is_some() {
        tracing::warn!(remaining = pending.count(), "Replay ended before the script did");
    }

    Ok(())
}
