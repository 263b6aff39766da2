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

//! Shared path conventions for rotated log files.
//!
//! The logging layer and the Engine<->Hub adapter's `log.query` handler both need to agree on
//! where a given engine's log lives for a given date, so the convention is centralized here
//! rather than duplicated.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Returns the path to `engine`'s log file for `date`, or the live (un-suffixed) file when
/// `date` is today.
#[must_use]
pub fn log_file_path(log_dir: &Path, engine: &str, date: NaiveDate, today: NaiveDate) -> PathBuf {
    if date == today {
        log_dir.join(format!("{engine}.log"))
    } else {
        log_dir.join(format!("{engine}.log.{date}"))
    }
}

/// Returns the directory where rotated log files older than `retention_days` live, so a startup
/// sweep can prune them (mirrors `TimedRotatingFileHandler(backupCount=30)`'s eviction).
#[must_use]
pub fn is_expired(file_date: NaiveDate, today: NaiveDate, retention_days: i64) -> bool {
    (today - file_date).num_days() > retention_days
}
