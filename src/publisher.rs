// Periodic status publisher
// Samples the T'Rex status at a fixed rate and broadcasts each reading over Zenoh.
// A failed read is logged and skipped; the loop keeps its cadence.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::{TOPIC_HEALTH, TOPIC_STATUS};
use crate::messages::{PublisherHealth, StatusFormat};
use crate::trex::{BusTransport, DriverError, Telemetry, TrexDriver};

pub struct StatusPublisher {
    format: StatusFormat,
    health: PublisherHealth,
    consecutive_failures: u32,
}

impl StatusPublisher {
    pub fn new(format: StatusFormat) -> Self {
        Self {
            format,
            health: PublisherHealth::ReadFailed, // Until the first good read
            consecutive_failures: 0,
        }
    }

    pub fn health(&self) -> PublisherHealth {
        self.health
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Process one status sample, returning the payload to publish if any
    pub fn on_sample(&mut self, sample: Result<Telemetry, DriverError>) -> Option<String> {
        let telemetry = match sample {
            Ok(telemetry) => telemetry,
            Err(e) => {
                self.consecutive_failures += 1;
                // First failure of a streak is a warning, the rest are debug
                if self.consecutive_failures == 1 {
                    warn!("Status read failed, skipping: {}", e);
                } else {
                    debug!(
                        "Status read failed ({} in a row): {}",
                        self.consecutive_failures, e
                    );
                }
                self.health = PublisherHealth::ReadFailed;
                return None;
            }
        };

        if self.consecutive_failures > 0 {
            info!(
                "Status reads recovered after {} failures",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
        self.health = PublisherHealth::Ok;

        match self.format.encode(&telemetry) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Failed to encode telemetry: {}", e);
                None
            }
        }
    }
}

/// Interval between samples for a rate in Hz
pub fn tick_period(rate_hz: u64) -> Duration {
    Duration::from_micros(1_000_000 / rate_hz.max(1))
}

pub async fn run<T: BusTransport + 'static>(
    driver: Arc<TrexDriver<T>>,
    rate_hz: u64,
    format: StatusFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let pub_status = session.declare_publisher(TOPIC_STATUS).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut publisher = StatusPublisher::new(format);
    let mut tick = interval(tick_period(rate_hz));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Publisher started: {}Hz, format {:?}", rate_hz, format);
    info!("Publishing to: {}, {}", TOPIC_STATUS, TOPIC_HEALTH);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down publisher");
                break;
            }
        }

        // 1. Read status off the async threads (bus I/O blocks)
        let reader = Arc::clone(&driver);
        let sample = tokio::task::spawn_blocking(move || reader.read_status()).await?;

        // 2. Publish the reading, if there is one
        if let Some(payload) = publisher.on_sample(sample) {
            pub_status.put(payload).await?;
        }

        // 3. Publish health
        let health_json = serde_json::to_string(&publisher.health())?;
        pub_health.put(health_json).await?;
    }

    session.close().await?;
    Ok(())
}
