pub mod calibration;
pub mod frame;
pub mod protocol;
pub mod target;
pub mod tracking;
pub mod types;

use anyhow::Result;
use calibration::CalibrationState;
use glam::DVec3;
use protocol::ProtocolParser;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracking::Tracker;
use types::{SensorSample, TargetOrientation};

/// Samples buffered between connection readers and the tracking task.
const SAMPLE_QUEUE_DEPTH: usize = 256;

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Commands sent to the tracking task.
enum LinkCommand {
    ClearCalibration,
}

/// Handle to the sensor ingest side.
///
/// Listens for sensor connections, parses their message stream, runs the
/// calibration tracker and target synthesis, and publishes the latest target.
/// The tick side reads snapshots without blocking and feeds the vehicle's
/// forward back for the next calibration.
pub struct SensorLink {
    target_rx: watch::Receiver<TargetOrientation>,
    calibration_rx: watch::Receiver<CalibrationState>,
    vehicle_forward_tx: watch::Sender<DVec3>,
    command_tx: mpsc::UnboundedSender<LinkCommand>,
    local_addr: Option<SocketAddr>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl SensorLink {
    /// Bind the ingest server and start processing.
    pub async fn bind(addr: &str, max_line_bytes: usize) -> Result<Self> {
        tracing::info!(%addr, "Starting sensor ingest");

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "Sensor ingest listening");

        let (target_tx, target_rx) = watch::channel(TargetOrientation::DEFAULT);
        let (calibration_tx, calibration_rx) = watch::channel(CalibrationState::default());
        let (vehicle_forward_tx, vehicle_forward_rx) = watch::channel(DVec3::X);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (sample_tx, sample_rx) = mpsc::channel(SAMPLE_QUEUE_DEPTH);

        let tracker = Tracker::new(target_tx, calibration_tx);
        let tasks = vec![
            tokio::spawn(accept_loop(listener, sample_tx, max_line_bytes)),
            tokio::spawn(tracking_loop(
                tracker,
                sample_rx,
                command_rx,
                vehicle_forward_rx,
            )),
        ];

        Ok(Self {
            target_rx,
            calibration_rx,
            vehicle_forward_tx,
            command_tx,
            local_addr: Some(local_addr),
            tasks,
        })
    }

    /// A link with no transport behind it. The target stays at its default.
    pub fn offline() -> Self {
        let (_, target_rx) = watch::channel(TargetOrientation::DEFAULT);
        let (_, calibration_rx) = watch::channel(CalibrationState::default());
        let (vehicle_forward_tx, _) = watch::channel(DVec3::X);
        let (command_tx, _) = mpsc::unbounded_channel();
        Self {
            target_rx,
            calibration_rx,
            vehicle_forward_tx,
            command_tx,
            local_addr: None,
            tasks: Vec::new(),
        }
    }

    /// Latest published target (non-blocking).
    pub fn target(&self) -> TargetOrientation {
        *self.target_rx.borrow()
    }

    /// Latest published calibration reference (non-blocking).
    pub fn calibration(&self) -> CalibrationState {
        *self.calibration_rx.borrow()
    }

    /// Record the vehicle's current forward; used when the next reset is accepted.
    pub fn publish_vehicle_forward(&self, forward: DVec3) {
        self.vehicle_forward_tx.send_replace(forward);
    }

    /// Accept the next reset whatever its counter.
    pub fn clear_calibration(&self) {
        let _ = self.command_tx.send(LinkCommand::ClearCalibration);
    }

    /// Address the ingest server is bound to, if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for SensorLink {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Background task: accept sensor connections and hand each to a reader task.
///
/// Readers live in a `JoinSet` owned here, so aborting this task closes every
/// open connection too.
async fn accept_loop(
    listener: TcpListener,
    sample_tx: mpsc::Sender<SensorSample>,
    max_line_bytes: usize,
) {
    let mut readers = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::info!(%peer, "Sensor connected");
                    readers.spawn(read_loop(stream, peer, sample_tx.clone(), max_line_bytes));
                }
                Err(e) => {
                    tracing::warn!(?e, "Failed to accept sensor connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            // Reap finished readers.
            Some(_) = readers.join_next(), if !readers.is_empty() => {}
        }
    }
}

/// Per-connection task: read the stream, parse lines, forward valid samples.
async fn read_loop(
    mut stream: TcpStream,
    peer: SocketAddr,
    sample_tx: mpsc::Sender<SensorSample>,
    max_line_bytes: usize,
) {
    let mut parser = ProtocolParser::new(max_line_bytes);
    let mut buf = [0u8; 4096];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                tracing::info!(%peer, "Sensor disconnected");
                break;
            }
            Ok(n) => {
                parser.push_data(&buf[..n]);

                while let Some(result) = parser.next_sample() {
                    match result {
                        Ok(sample) => {
                            if sample_tx.send(sample).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(%peer, error = %e, "Rejected sensor message");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(%peer, ?e, "Sensor read error");
                break;
            }
        }
    }
}

/// Background task: the only writer of calibration and target state.
async fn tracking_loop(
    mut tracker: Tracker,
    mut sample_rx: mpsc::Receiver<SensorSample>,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
    vehicle_forward_rx: watch::Receiver<DVec3>,
) {
    let mut sample_count: u64 = 0;

    loop {
        tokio::select! {
            Some(sample) = sample_rx.recv() => {
                let vehicle_forward = *vehicle_forward_rx.borrow();
                tracking::feed(&mut tracker, &sample, vehicle_forward);

                sample_count += 1;
                if sample_count % 1000 == 0 {
                    tracing::debug!(sample_count, "Sensor samples processed");
                }
            }
            Some(cmd) = command_rx.recv() => {
                match cmd {
                    LinkCommand::ClearCalibration => tracker.clear_calibration(),
                }
            }
            else => break,
        }
    }
}
