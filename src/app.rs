use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::clock::Clock;
use crate::sink::TextSink;
use crate::system::{BootInstant, Uptime};

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

/// Renders the uptime since a fixed boot instant into a sink.
pub struct Ticker<C, S> {
    boot: BootInstant,
    clock: C,
    sink: S,
    failures: u64,
}

impl<C: Clock, S: TextSink> Ticker<C, S> {
    pub fn new(boot: BootInstant, clock: C, sink: S) -> Self {
        Ticker {
            boot,
            clock,
            sink,
            failures: 0,
        }
    }

    pub fn boot(&self) -> BootInstant {
        self.boot
    }

    pub fn uptime(&self) -> Uptime {
        Uptime::compute(self.boot, self.clock.now_millis())
    }

    /// Writes the current uptime to the sink.
    ///
    /// A failed write is logged and otherwise ignored, the next tick tries
    /// again.
    pub fn tick(&mut self) {
        let text = self.uptime().to_string();

        match self.sink.set_text(&text) {
            Ok(()) => {
                if self.failures > 0 {
                    info!("display updated again after {} failed updates", self.failures);
                    self.failures = 0;
                }
            }
            Err(err) => {
                self.failures += 1;
                if self.failures == 1 {
                    warn!("unable to update display: {}", err);
                } else {
                    debug!("unable to update display ({} in a row): {}", self.failures, err);
                }
            }
        }
    }

    /// Consecutive failed writes since the last successful one.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl<C, S> Ticker<C, S>
where
    C: Clock + 'static,
    S: TextSink + 'static,
{
    /// Ticks every `period` on a worker thread, the first tick one period
    /// from now.
    pub fn start(mut self, period: Duration) -> io::Result<TickerHandle<C, S>> {
        let (stop, stopped) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("uptime-ticker".to_string())
            .spawn(move || {
                debug!("ticker started, period {:?}", period);
                let mut deadline = Instant::now() + period;

                loop {
                    let timeout = deadline.saturating_duration_since(Instant::now());
                    match stopped.recv_timeout(timeout) {
                        Err(RecvTimeoutError::Timeout) => {
                            self.tick();

                            deadline += period;
                            let now = Instant::now();
                            if deadline < now {
                                debug!("ticker fell behind, skipping missed ticks");
                                deadline = now + period;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                debug!("ticker stopped");
                self
            })?;

        Ok(TickerHandle { stop, thread })
    }
}

/// A running ticker. Dropping the handle stops it without waiting.
pub struct TickerHandle<C, S> {
    stop: Sender<()>,
    thread: JoinHandle<Ticker<C, S>>,
}

impl<C, S> TickerHandle<C, S> {
    /// Stops ticking and hands the ticker back so it can be started again.
    pub fn stop(self) -> thread::Result<Ticker<C, S>> {
        let TickerHandle { stop, thread } = self;
        drop(stop);
        thread.join()
    }

    /// Blocks for as long as the ticker runs.
    pub fn wait(self) -> thread::Result<Ticker<C, S>> {
        let TickerHandle { stop, thread } = self;
        let result = thread.join();
        drop(stop);
        result
    }
}
