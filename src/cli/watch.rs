use std::{io::Write, time::Duration};

use anyhow::Result;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    tracking::storage::state_storage::{load_state, StateStorage},
    utils::clock::Clock,
};

use super::render::render_status;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically re-reads the stored state and prints the derived status. It never writes the
/// state, so it can run next to other invocations that do.
pub struct WatchModule<S, W> {
    storage: S,
    output: W,
    shutdown: CancellationToken,
    refresh_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl<S: StateStorage, W: Write> WatchModule<S, W> {
    pub fn new(
        storage: S,
        output: W,
        shutdown: CancellationToken,
        refresh_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            output,
            shutdown,
            refresh_interval,
            time_provider,
        }
    }

    async fn refresh(&mut self) -> Result<()> {
        let state = load_state(&self.storage).await?;
        let status = render_status(&state, self.time_provider.time());
        writeln!(self.output, "{status}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Executes the refresh loop until the shutdown token is cancelled.
    pub async fn run(&mut self) -> Result<()> {
        let mut refresh_point = self.time_provider.instant();
        loop {
            refresh_point += self.refresh_interval;

            if let Err(e) = self.refresh().await {
                error!("Failed to refresh status {e:?}");
            }

            select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Stopping watch");
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(refresh_point) => ()
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Cancels `cancelation` on Ctrl-C.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use chrono::{Local, TimeZone, Utc};
    use tokio_util::sync::CancellationToken;

    use crate::{
        tracking::storage::state_storage::memory::MemoryStateStorage,
        utils::clock::manual::ManualClock,
    };

    use super::WatchModule;

    fn clock() -> ManualClock {
        ManualClock::new(
            Local
                .with_ymd_and_hms(2018, 7, 2, 9, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_refreshes_until_cancelled() -> Result<()> {
        let storage = MemoryStateStorage::with_blob(r#"{"totalBalanceMinutes": 90}"#);
        let shutdown = CancellationToken::new();
        let mut module = WatchModule::new(
            storage,
            Vec::new(),
            shutdown.clone(),
            Duration::from_secs(60),
            Box::new(clock()),
        );

        let (_, result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_secs(150)).await;
                shutdown.cancel()
            },
            module.run(),
        );
        result?;

        let output = String::from_utf8(module.into_output())?;
        assert_eq!(output.matches("Balance: +1:30").count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_does_not_write() -> Result<()> {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let mut module = WatchModule::new(
            MemoryStateStorage::default(),
            Vec::new(),
            shutdown,
            Duration::from_secs(60),
            Box::new(clock()),
        );

        module.run().await?;

        assert_eq!(module.storage.writes(), 0);
        assert!(String::from_utf8(module.into_output())?.contains("Balance: +0:00"));
        Ok(())
    }
}
