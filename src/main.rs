use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use structopt::StructOpt;
use systemstat::{Platform, System};

use uptime_ticker::app::{Ticker, DEFAULT_PERIOD};
use uptime_ticker::clock::{Clock, SystemClock};
use uptime_ticker::logging::init_logging;
use uptime_ticker::sink::{FileSink, StdoutSink, TextSink};
use uptime_ticker::system::BootInstant;

#[derive(StructOpt, Debug, Clone)]
#[structopt(name = "uptime-ticker", about = "Shows the time since boot, updated every second.")]
struct Options {
    /// Boot time in seconds since the Unix epoch [default: derived from the host uptime]
    #[structopt(short, long)]
    boot_time: Option<String>,

    /// Milliseconds between updates [default: 1000]
    #[structopt(short, long)]
    period: Option<u64>,

    /// Keep this file updated instead of writing to stdout
    #[structopt(short, long, parse(from_os_str))]
    file: Option<PathBuf>,

    /// Don't loop, just render once and exit
    #[structopt(short, long)]
    oneshot: bool,

    /// Log filter, e.g. "debug" (overrides RUST_LOG). Logs go to stderr; on a
    /// terminal each one clears the uptime line, which is redrawn on the next tick
    #[structopt(short, long)]
    log: Option<String>,
}

impl Options {
    fn period(&self) -> Result<Duration> {
        match self.period {
            Some(0) => bail!("period must be greater than zero"),
            Some(millis) => Ok(Duration::from_millis(millis)),
            None => Ok(DEFAULT_PERIOD),
        }
    }

    /// Whether stdout output redraws one line in place.
    fn rewrite_stdout(&self, stdout_is_terminal: bool) -> bool {
        self.file.is_none() && !self.oneshot && stdout_is_terminal
    }
}

fn main() -> Result<()> {
    let options = Options::from_args();
    let rewrite = options.rewrite_stdout(io::stdout().is_terminal());
    init_logging(options.log.as_deref(), rewrite && io::stderr().is_terminal());

    let period = options.period()?;
    let clock = SystemClock;

    let boot = match &options.boot_time {
        Some(text) => {
            let boot = BootInstant::parse(text);
            if !boot.is_valid() {
                warn!("boot time {:?} is not a number", text);
            }
            boot
        }
        None => BootInstant::from_system(&System::new(), clock.now_millis())
            .context("unable to read host uptime")?,
    };

    let sink: Box<dyn TextSink> = match &options.file {
        Some(path) => {
            let sink = FileSink::new(path)
                .with_context(|| format!("invalid output file {}", path.display()))?;
            info!("Writing uptime to {}", sink.path().display());
            Box::new(sink)
        }
        None => Box::new(StdoutSink::new(rewrite)),
    };

    let mut ticker = Ticker::new(boot, clock, sink);
    info!("Boot time {:?}", ticker.boot().seconds());

    if options.oneshot {
        ticker.tick();
        if ticker.failures() > 0 {
            bail!("unable to update display");
        }
        return Ok(());
    }

    let handle = ticker.start(period).context("unable to start ticker")?;
    info!("Updating every {:?}", period);

    handle
        .wait()
        .map_err(|_| anyhow!("ticker thread panicked"))?;

    Ok(())
}
