mod host;

use anyhow::Result;
use gyrobot_config::AppConfig;
use gyrobot_control::input::SharedInput;
use gyrobot_control::{Agent, RotationController};
use gyrobot_sensor::SensorLink;
use host::{HeldHost, SimulationHost};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Ticks between debug heartbeats.
const HEARTBEAT_TICKS: u64 = 600;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gyrobot=info,gyrobot_sensor=info,gyrobot_control=info".into()),
        )
        .init();

    info!("gyrobot starting");

    let config = gyrobot_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    info!(
        tick_rate_hz = config.tick_rate_hz,
        listen_addr = %config.sensor.listen_addr,
        "Config loaded"
    );

    // Without a sensor the vehicle still holds the default target.
    let link = match SensorLink::bind(&config.sensor.listen_addr, config.sensor.max_line_bytes).await
    {
        Ok(link) => link,
        Err(e) => {
            warn!(?e, "Sensor listener not available, holding default target");
            SensorLink::offline()
        }
    };

    let mut host = HeldHost::new(config.tick_rate_hz, &config.host, &config.control);
    let input = SharedInput::new();
    let controller = RotationController::new(
        config.control.natural_frequency,
        config.control.damping_ratio,
        config.control.max_angular_acceleration,
    );
    let mut agent = Agent::initialize(&host.field_info(), controller, link, input.clone());

    info!("Commands: b = toggle boost, j = toggle jump, c = clear calibration");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let period = Duration::from_secs_f64(1.0 / sanitized_rate(config.tick_rate_hz));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last = Instant::now();
    let mut tick_count: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last).as_secs_f64();
                last = now;

                let tick = host.poll(elapsed);
                let command = agent.step(&tick);
                host.apply(&command);

                let view = agent.debug_view();
                tracing::trace!(
                    target_forward = ?view.target_forward,
                    current_forward = ?view.current_forward,
                    reference_forward = ?view.reference_forward,
                    "Debug view"
                );

                tick_count += 1;
                if tick_count % HEARTBEAT_TICKS == 0 {
                    tracing::debug!(
                        ticks = tick_count,
                        forward = ?tick.pose.forward(),
                        target = ?view.target_forward,
                        ?command,
                        "Control heartbeat"
                    );
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => handle_command(line.trim(), &input, agent.targets()),
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!(?e, "Failed to read stdin, operator commands disabled");
                        stdin_open = false;
                    }
                }
            }
            _ = &mut shutdown => {
                info!(ticks = tick_count, "Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn handle_command(line: &str, input: &SharedInput, link: &SensorLink) {
    match line {
        "b" => info!(boost = input.toggle_boost(), "Boost toggled"),
        "j" => info!(jump = input.toggle_jump(), "Jump toggled"),
        "c" => {
            link.clear_calibration();
            info!("Calibration cleared, next sample recalibrates");
        }
        "" => {}
        other => warn!(command = other, "Unknown command"),
    }
}

fn sanitized_rate(tick_rate_hz: f64) -> f64 {
    if tick_rate_hz.is_finite() && tick_rate_hz > 0.0 {
        tick_rate_hz
    } else {
        warn!(tick_rate_hz, "Unusable tick rate, using 120 Hz");
        120.0
    }
}
