//! Extension pour lire les réglages du lecteur depuis tchconfig

use crate::scheduler::SchedulerSettings;
use anyhow::Result;
use std::time::Duration;
use tchconfig::Config;

pub trait PlayerConfigExt {
    /// Délai d'inactivité et pas de sondage du scheduler
    fn scheduler_settings(&self) -> Result<SchedulerSettings>;

    /// Exécutable mpv
    fn get_mpv_binary(&self) -> String;
}

impl PlayerConfigExt for Config {
    fn scheduler_settings(&self) -> Result<SchedulerSettings> {
        Ok(SchedulerSettings::new(
            Duration::from_secs(self.get_idle_timeout_secs()? as u64),
            Duration::from_millis(self.get_poll_interval_ms()? as u64),
        ))
    }

    fn get_mpv_binary(&self) -> String {
        #[cfg(unix)]
        let default = crate::mpv::DEFAULT_MPV_BINARY;
        #[cfg(not(unix))]
        let default = "mpv";
        self.get_string_or(&["audio", "mpv_binary"], default)
    }
}
