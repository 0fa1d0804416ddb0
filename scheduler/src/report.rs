use std::{fmt::Display, future::Future, time::Duration};

use shared::error::{AppError, AppResult};

// 1 回のスイープで扱ったレコード数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub processed: usize,
    // 他の処理が先に状態を変えていた、または時間切れ
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.processed == 0 && self.skipped == 0 && self.failed == 0
    }

    // 1 レコードの結果を数える。Ok(false) は対象外だったことを表す
    pub(crate) fn tally(&mut self, sweep: &'static str, record: &dyn Display, result: AppResult<bool>) {
        match result {
            Ok(true) => self.processed += 1,
            Ok(false) => self.skipped += 1,
            Err(AppError::Conflict(message)) => {
                tracing::debug!(sweep, %record, %message, "record already moved on");
                self.skipped += 1;
            }
            Err(e @ AppError::TimeoutError(_)) => {
                tracing::warn!(sweep, %record, error.message = %e, "record timed out");
                self.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(
                    sweep,
                    %record,
                    error.cause_chain = ?e,
                    error.message = %e,
                    "record failed"
                );
                self.failed += 1;
            }
        }
    }

    pub(crate) fn log(&self, sweep: &'static str) {
        let SweepReport {
            processed,
            skipped,
            failed,
        } = *self;
        if self.is_empty() {
            tracing::debug!(sweep, "nothing to do");
        } else {
            tracing::info!(sweep, processed, skipped, failed, "sweep finished");
        }
    }
}

// 1 レコードの処理に上限時間を設ける
pub(crate) async fn bounded<T>(
    limit: Duration,
    record: &(dyn Display + Sync),
    fut: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AppError::TimeoutError(format!("{record} ({limit:?})")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_classifies_outcomes() {
        let mut report = SweepReport::default();
        assert!(report.is_empty());

        report.tally("test", &1, Ok(true));
        report.tally("test", &2, Ok(false));
        report.tally("test", &3, Err(AppError::Conflict("moved".into())));
        report.tally("test", &4, Err(AppError::TimeoutError("slow".into())));
        report.tally("test", &5, Err(AppError::NoRowsAffectedError("gone".into())));

        assert_eq!(
            report,
            SweepReport {
                processed: 1,
                skipped: 3,
                failed: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_turns_elapsed_into_timeout_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        };
        let res = bounded(Duration::from_secs(10), &"booking#1", slow).await;
        assert!(matches!(res, Err(AppError::TimeoutError(_))));

        let fast = bounded(Duration::from_secs(10), &"booking#2", async { Ok(7) }).await;
        assert_eq!(fast.ok(), Some(7));
    }

    fn assert_send<T: Send>(_: &T) {}

    // スイープの future は tokio::spawn に渡すので Send でなければならない
    #[test]
    fn bounded_future_is_send() {
        let record = kernel::model::id::BookingId::new(1);
        let fut = bounded(Duration::from_secs(1), &record, async { Ok(()) });
        assert_send(&fut);
    }
}
