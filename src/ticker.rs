use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;


// Cancellable periodic task. The callback runs on a dedicated thread every `interval` until
// the ticker is cancelled or dropped, or the callback returns `false`.
//
// Cancellation is observed before each call, so no tick is delivered after `cancel` returns
// except for one that was already in progress.
pub struct Ticker {
    cancelled: Arc<AtomicBool>,
}

impl Ticker {
    pub fn start(interval: Duration, mut on_tick: impl FnMut() -> bool + Send + 'static) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancelled_copy = Arc::clone(&cancelled);
        thread::spawn(move || {
            loop {
                thread::sleep(interval);
                if cancelled_copy.load(Ordering::Acquire) || !on_tick() {
                    break;
                }
            }
        });
        Ticker { cancelled }
    }

    pub fn cancel(&self) { self.cancelled.store(true, Ordering::Release); }
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Acquire) }
}

impl Drop for Ticker {
    fn drop(&mut self) { self.cancel(); }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn ticks_until_cancelled() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::start(Duration::from_millis(1), move || tx.send(()).is_ok());
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(10)).unwrap();
        }
        ticker.cancel();
        assert!(ticker.is_cancelled());
        // The thread exits and drops the sender.
        while rx.recv_timeout(Duration::from_secs(10)).is_ok() {}
    }

    #[test]
    fn callback_can_stop_ticker() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_copy = Arc::clone(&count);
        let (tx, rx) = mpsc::channel::<()>();
        let _ticker = Ticker::start(Duration::from_millis(1), move || {
            let _keep_alive = &tx;
            count_copy.fetch_add(1, Ordering::SeqCst) < 2
        });
        // Sender is dropped when the thread finishes.
        assert!(rx.recv_timeout(Duration::from_secs(10)).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
