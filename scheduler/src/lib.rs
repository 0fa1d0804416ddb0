use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registry::AppRegistry;
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::MissedTickBehavior,
};

pub mod sweep;

mod report;

pub use report::SweepReport;

use sweep::{
    booking::{BookingScheduleSweep, BookingStartSweep},
    conversation::ConversationExpirySweep,
    payment::PaymentExpirySweep,
};

// 定期実行される 1 種類の処理
#[async_trait]
pub trait Sweep: Send + Sync {
    async fn run(&self, now: DateTime<Utc>) -> SweepReport;
}

struct ScheduledTask {
    name: &'static str,
    interval: Duration,
    sweep: Arc<dyn Sweep>,
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: &'static str, interval: Duration, sweep: Arc<dyn Sweep>) -> Self {
        self.tasks.push(ScheduledTask {
            name,
            interval,
            sweep,
        });
        self
    }

    // 予約・注文のライフサイクルを進める 4 つのスイープを登録する
    pub fn from_registry(registry: &AppRegistry) -> Self {
        let config = registry.scheduler_config();
        let booking = registry.booking_config();
        let window = chrono::Duration::minutes(booking.conversation_window_minutes);

        Self::new()
            .register(
                "payment-expiry",
                config.sweep_interval,
                Arc::new(PaymentExpirySweep::new(
                    registry.payment_repository(),
                    config.record_timeout,
                )),
            )
            .register(
                "booking-schedule",
                config.sweep_interval,
                Arc::new(BookingScheduleSweep::new(
                    registry.booking_repository(),
                    registry.conversation_repository(),
                    window,
                    config.record_timeout,
                )),
            )
            .register(
                "booking-start",
                config.sweep_interval,
                Arc::new(BookingStartSweep::new(
                    registry.booking_repository(),
                    config.record_timeout,
                )),
            )
            .register(
                "conversation-expiry",
                config.sweep_interval,
                Arc::new(ConversationExpirySweep::new(
                    registry.conversation_repository(),
                    config.record_timeout,
                )),
            )
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name).collect()
    }

    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, _) = broadcast::channel(1);

        let tasks = self
            .tasks
            .into_iter()
            .map(|task| {
                let name = task.name;
                let shutdown_rx = shutdown_tx.subscribe();
                tracing::info!(sweep = name, interval = ?task.interval, "sweep started");
                (name, tokio::spawn(run_task(task, shutdown_rx)))
            })
            .collect();

        SchedulerHandle { shutdown_tx, tasks }
    }
}

async fn run_task(task: ScheduledTask, mut shutdown_rx: broadcast::Receiver<()>) {
    let ScheduledTask {
        name,
        interval,
        sweep,
    } = task;

    // 前回のスイープが終わるまで次の tick は来ない
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                let report = sweep.run(Utc::now()).await;
                report.log(name);
            }
        }
    }

    tracing::info!(sweep = name, "sweep stopped");
}

pub struct SchedulerHandle {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl SchedulerHandle {
    // 実行中のスイープは最後まで処理してから止まる
    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            tracing::debug!("no sweep is running");
        }
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(sweep = name, error.message = %e, "sweep task panicked");
            }
        }
    }
}
