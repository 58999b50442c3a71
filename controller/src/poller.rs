use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use plantcare_common::PollingConfig;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    Status,
    Schedule,
    Sensor,
}

pub struct Poller {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(session: Arc<Session>, polling: PollingConfig) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut status_tick = ticker(polling.status_interval());
            let mut schedule_tick = ticker(polling.schedule_interval());
            let mut sensor_tick = ticker(polling.sensor_interval());

            loop {
                let cycle = tokio::select! {
                    _ = stop.changed() => break,
                    _ = status_tick.tick() => Cycle::Status,
                    _ = schedule_tick.tick() => Cycle::Schedule,
                    _ = sensor_tick.tick() => Cycle::Sensor,
                };

                debug!("poll cycle: {cycle:?}");
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = run_cycle(&session, cycle) => {}
                }
            }

            info!("poller stopped");
        });

        Self { shutdown, task }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!("poller task ended abnormally: {err}");
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

// Failures are already surfaced as notifications by the session.
async fn run_cycle(session: &Session, cycle: Cycle) {
    match cycle {
        Cycle::Status => {
            let _ = session.poll_mode().await;
            let _ = session.poll_device_status().await;
        }
        Cycle::Schedule => {
            let _ = session.poll_schedule().await;
        }
        Cycle::Sensor => {
            let _ = session.poll_sensor().await;
        }
    }
}
