use std::{future::Future, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, sleep_until},
};

/// Countdown owned by the round it belongs to.
///
/// Wakes once per `period` until `duration_secs` have elapsed, reporting the
/// whole seconds left each time that value changes, then runs the expiry
/// callback exactly once. The period only sets the reporting granularity; the
/// round always lasts `duration_secs`. Dropping the timer cancels it.
#[derive(Debug)]
pub struct RoundTimer {
    handle: Option<JoinHandle<()>>,
}

impl RoundTimer {
    /// Spawn the countdown on the current Tokio runtime.
    pub fn start<T, TF, E, EF>(
        duration_secs: u32,
        period: Duration,
        mut on_tick: T,
        on_expire: E,
    ) -> Self
    where
        T: FnMut(u32) -> TF + Send + 'static,
        TF: Future<Output = ()> + Send + 'static,
        E: FnOnce() -> EF + Send + 'static,
        EF: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let started = Instant::now();
        let handle = tokio::spawn(async move {
            let total = Duration::from_secs(u64::from(duration_secs));
            let mut elapsed = Duration::ZERO;
            let mut reported = duration_secs;
            while elapsed < total {
                elapsed = (elapsed + period).min(total);
                sleep_until(started + elapsed).await;
                let remaining = whole_seconds_left(total - elapsed);
                if remaining != reported {
                    reported = remaining;
                    on_tick(remaining).await;
                }
            }
            on_expire().await;
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Stop the countdown. Safe to call any number of times; returns whether a task was stopped.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Release the task without aborting it, used once the expiry callback is already running.
    pub fn disarm(&mut self) {
        self.handle.take();
    }

    /// Whether the countdown task is still alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Seconds shown to clients: a partially elapsed second still counts.
fn whole_seconds_left(remaining: Duration) -> u32 {
    u32::try_from(remaining.as_millis().div_ceil(1000)).unwrap_or(u32::MAX)
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio::sync::mpsc;

    use super::*;

    const PERIOD: Duration = Duration::from_secs(1);

    fn counting_timer(
        duration_secs: u32,
    ) -> (RoundTimer, mpsc::UnboundedReceiver<u32>, Arc<AtomicUsize>) {
        counting_timer_every(duration_secs, PERIOD)
    }

    fn counting_timer_every(
        duration_secs: u32,
        period: Duration,
    ) -> (RoundTimer, mpsc::UnboundedReceiver<u32>, Arc<AtomicUsize>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let expired = Arc::new(AtomicUsize::new(0));
        let expired_clone = expired.clone();
        let timer = RoundTimer::start(
            duration_secs,
            period,
            move |remaining| {
                let tx = tick_tx.clone();
                async move {
                    let _ = tx.send(remaining);
                }
            },
            move || async move {
                expired_clone.fetch_add(1, Ordering::SeqCst);
            },
        );
        (timer, tick_rx, expired)
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_then_expires_once() {
        let (timer, mut ticks, expired) = counting_timer(3);

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let mut seen = Vec::new();
        while let Ok(remaining) = ticks.try_recv() {
            seen.push(remaining);
        }
        assert_eq!(seen, vec![2, 1, 0]);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn finer_period_keeps_the_round_length() {
        let (_timer, mut ticks, expired) = counting_timer_every(3, Duration::from_millis(250));

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut seen = Vec::new();
        while let Ok(remaining) = ticks.try_recv() {
            seen.push(remaining);
        }
        assert_eq!(seen, vec![2, 1, 0]);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn coarser_period_still_expires_on_time() {
        let (_timer, mut ticks, expired) = counting_timer_every(3, Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        let mut seen = Vec::new();
        while let Ok(remaining) = ticks.try_recv() {
            seen.push(remaining);
        }
        assert_eq!(seen, vec![1, 0]);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks_and_expiry() {
        let (mut timer, mut ticks, expired) = counting_timer(5);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(timer.cancel());
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(ticks.try_recv(), Ok(4));
        assert!(ticks.try_recv().is_err());
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (mut timer, _ticks, expired) = counting_timer(2);
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert!(!timer.cancel());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_cancels_it() {
        let (timer, _ticks, expired) = counting_timer(1);
        drop(timer);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }
}
