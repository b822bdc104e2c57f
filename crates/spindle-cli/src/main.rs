use std::error::Error;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spindle_core::{
    Context, NO_TAGS, Scheduler, SchedulerConfig, Script, ScriptError, Sequence, Step,
};

const CLOCK_TAG: &str = "clock";
const CLOCK_FINISHED: &str = "Clock finished";

/// デモの設定（第 1 引数で JSON ファイルを渡すと上書き）
#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// 1 フレームの実時間（ミリ秒）
    frame_ms: u64,
    /// フレーム時間に掛ける倍率。2.0 なら scheduler の時計は 2 倍速で進む
    time_scale: f64,
    /// 修理後に鳴らす Tick/Tock の回数
    encore: u32,
    clockmaker: String,
    fix_seconds: f64,
    scheduler: SchedulerConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frame_ms: 50,
            time_scale: 1.0,
            encore: 4,
            clockmaker: "Gilligan".to_string(),
            fix_seconds: 3.0,
            scheduler: SchedulerConfig::default(),
        }
    }
}

fn load_config() -> Result<DemoConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let config = serde_json::from_str(&raw)?;
            info!(%path, "config loaded");
            Ok(config)
        }
        None => Ok(DemoConfig::default()),
    }
}

fn tick_or_tock(i: u32) -> &'static str {
    if i % 2 == 0 { "Tock" } else { "Tick" }
}

enum Phase {
    /// 壊れるまでの 8 回
    Counting(u32),
    /// 修理後のアンコール
    Encore(u32),
}

/// 1 秒おきに Tick/Tock を鳴らし、8 回で自分を止めて時計屋を呼ぶ時計
struct TickTock {
    phase: Phase,
    encore: u32,
}

impl TickTock {
    fn new(encore: u32) -> Self {
        Self {
            phase: Phase::Counting(0),
            encore,
        }
    }
}

impl Script for TickTock {
    fn step(&mut self, cx: &mut Context<'_>) -> Result<Step, ScriptError> {
        match self.phase {
            Phase::Counting(i) if i < 8 => {
                let i = i + 1;
                println!("{}", tick_or_tock(i));
                self.phase = Phase::Counting(i);
                Ok(Step::wait_seconds(1.0))
            }
            Phase::Counting(_) => {
                // 時計を壊す。resume されるまでこのタスクは進まない
                cx.pause_by_tag(CLOCK_TAG);
                cx.send_signal(CLOCK_FINISHED);
                self.phase = Phase::Encore(0);
                Ok(Step::Skip)
            }
            Phase::Encore(i) if i < self.encore => {
                let i = i + 1;
                println!("{}", tick_or_tock(i));
                self.phase = Phase::Encore(i);
                Ok(Step::wait_seconds(1.0))
            }
            Phase::Encore(_) => Ok(Step::Complete),
        }
    }
}

/// 止まった時計を見つけて直す時計屋
fn clockmaker((name, fix_seconds): (String, f64)) -> Sequence {
    let full_name = format!("Clockmaker {name}");
    let done_name = full_name.clone();

    Sequence::new()
        .wait(Step::wait_signal(CLOCK_FINISHED))
        .wait(Step::wait_seconds(3.0))
        .then(move |_| {
            println!(
                "{full_name}: It seems the clock has stopped. \
                 I'll be fixin' that right up. That's my job, you see."
            );
            Ok(Step::wait_seconds(fix_seconds))
        })
        .then(|cx| {
            cx.resume_by_tag(CLOCK_TAG);
            Ok(Step::wait_seconds(2.0))
        })
        .then(move |_| {
            println!("{done_name}: There we go!");
            Ok(Step::Complete)
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config()?;
    info!(?config, "starting demo");

    let mut scheduler = Scheduler::builder()
        .config(config.scheduler.clone())
        .build();

    scheduler.execute(TickTock::new(config.encore), [CLOCK_TAG]);
    scheduler.execute_with_args(
        clockmaker,
        (config.clockmaker.clone(), config.fix_seconds),
        NO_TAGS,
    );

    // ゲームループ相当：固定フレームで update を呼び続ける
    let mut frames = interval(Duration::from_millis(config.frame_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let delta = config.frame_ms as f64 / 1000.0 * config.time_scale;
    if !(delta.is_finite() && delta > 0.0) {
        return Err(format!("frame_ms * time_scale must be positive, got {delta}").into());
    }

    while !scheduler.is_idle() {
        frames.tick().await;
        if let Err(err) = scheduler.update(delta) {
            error!(error = %err, "tick failed");
        }
    }

    info!(
        ticks = scheduler.tick_count(),
        seconds = scheduler.now(),
        "all tasks finished"
    );
    println!("{}", serde_json::to_string_pretty(&scheduler.snapshots())?);
    Ok(())
}
