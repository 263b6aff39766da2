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

//! Foundational types and utilities shared across the Ferrum trading runtime.
//!
//! This crate is intentionally small and dependency-light. It supplies:
//!
//! - Correctness-check helpers in the *design by contract* style.
//! - Nanosecond-precision timestamp and UUID helpers.
//! - A TOML-backed runtime configuration loader.
//! - Log-directory path conventions shared by the logging and adapter layers.

pub mod config;
pub mod correctness;
pub mod paths;
pub mod time;

pub use config::RuntimeConfig;
pub use time::UnixNanos;
