// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Ferrum Trading Systems. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Daily-rotating file logging, mirroring the original runtime's
//! `TimedRotatingFileHandler(when='D', interval=1, backupCount=30)` (§10.3).

use std::{fs, path::Path};

use chrono::Utc;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ferrum_core::paths::is_expired;

/// Installs a global tracing subscriber that writes `{log_dir}/{engine}.log`, rolled over daily,
/// and echoes to stdout. The returned [`WorkerGuard`] must be held for the process lifetime: once
/// dropped, the non-blocking writer stops flushing.
pub fn init(log_dir: &Path, engine: &str) -> anyhow::Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;
    let file_appender = rolling::daily(log_dir, format!("{engine}.log"));
    let (non_blocking_writer, guard) = non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_writer(non_blocking_writer).with_ansi(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

/// Deletes rotated log files in `log_dir` for `engine` older than `retention_days`, matching
/// `TimedRotatingFileHandler`'s `backupCount` eviction. Call once at startup.
///
/// # Errors
///
/// Returns an error if `log_dir` cannot be read.
pub fn sweep_expired(log_dir: &Path, engine: &str, retention_days: i64) -> anyhow::Result<usize> {
    let today = Utc::now().date_naive();
    let prefix = format!("{engine}.log.");
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(&prefix) else {
            continue;
        };
        let Ok(file_date) = suffix.parse::<chrono::NaiveDate>() else {
            continue;
        };
        if is_expired(file_date, today, retention_days) {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn sweep_removes_only_expired_rotated_files() {
        let dir = tempdir().unwrap();
        let today = Utc::now().date_naive();
        let stale = today - chrono::Duration::days(45);
        let fresh = today - chrono::Duration::days(1);

        fs::write(dir.path().join("mhi.log"), "live").unwrap();
        fs::write(dir.path().join(format!("mhi.log.{stale}")), "old").unwrap();
        fs::write(dir.path().join(format!("mhi.log.{fresh}")), "recent").unwrap();

        let removed = sweep_expired(dir.path(), "mhi", 30).unwrap();

        assert_eq!(removed, 1);
        assert!(dir.path().join("mhi.log").exists());
        assert!(dir.path().join(format!("mhi.log.{fresh}")).exists());
        assert!(!dir.path().join(format!("mhi.log.{stale}")).exists());
    }
}
