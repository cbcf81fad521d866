/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Readiness markers and console-log watching
//!
//! The marker strings are a contract with the server's logging output: a
//! subsystem announces it has finished initializing by writing a fixed
//! message code to the console log. The watcher scans the log from a
//! remembered offset so repeated waits never re-match earlier output.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, trace};

use crate::error::{HarnessError, Result};
use crate::retry::{RetryOutcome, RetryPolicy};

/// Application installed and started
pub const APP_STARTED_MARKER: &str = "CWWKZ0001I";
/// Security service reports ready
pub const SECURITY_READY_MARKER: &str = "CWWKS0008I";
/// Server startup complete
pub const SERVER_READY_MARKER: &str = "CWWKF0011I";
/// Feature update completed
pub const FEATURE_UPDATE_MARKER: &str = "CWWKF0008I";

/// Incremental scanner over a server console log.
///
/// Only complete lines are consumed; a partially written trailing line is
/// left for the next scan. A log shorter than the remembered offset is
/// treated as rotated and rescanned from the start.
#[derive(Debug)]
pub struct LogWatcher {
    path: PathBuf,
    offset: u64,
}

impl LogWatcher {
    /// Watch the log file at `path`, which may not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    /// The watched log path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and consume the complete lines written since the last scan.
    ///
    /// An empty list means the log is missing or nothing complete is new;
    /// IO failures other than a missing file are errors.
    fn read_new_lines(&mut self) -> Result<Vec<String>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "log not present yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        if len < self.offset {
            debug!(path = %self.path.display(), "log shrank, rescanning from start");
            self.offset = 0;
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut tail = String::new();
        file.read_to_string(&mut tail)?;

        // Consume up to the last complete line only
        let consumed = match tail.rfind('\n') {
            Some(end) => end + 1,
            None => return Ok(Vec::new()),
        };
        let complete = &tail[..consumed];
        self.offset += consumed as u64;
        Ok(complete.lines().map(str::to_string).collect())
    }

    /// Scan unconsumed complete lines for the first match of `re`.
    ///
    /// Returns `Ok(None)` while the log is missing or the marker has not
    /// appeared yet.
    pub fn scan(&mut self, re: &Regex) -> Result<Option<String>> {
        for line in self.read_new_lines()? {
            if re.is_match(&line) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Wait (bounded) for a marker pattern to appear in the log.
    ///
    /// `Ready` carries the matched line; `TimedOut` means the marker never
    /// showed up within the policy's budget and the caller decides whether
    /// that is fatal.
    pub async fn wait_for_marker(
        &mut self,
        pattern: &str,
        policy: &RetryPolicy,
    ) -> Result<RetryOutcome<String>> {
        let re = Regex::new(pattern)
            .map_err(|e| HarnessError::config(format!("bad marker pattern '{pattern}': {e}")))?;
        debug!(pattern, path = %self.path.display(), "waiting for readiness marker");
        policy.poll_until(|| self.scan(&re)).await
    }

    /// Wait (bounded) until every marker pattern has appeared.
    ///
    /// Subsystems log their markers in no fixed relative order, so each
    /// consumed line is matched against every still-unseen pattern in one
    /// pass. `Ready` carries the matched lines in the order the patterns
    /// were given.
    pub async fn wait_for_markers(
        &mut self,
        patterns: &[&str],
        policy: &RetryPolicy,
    ) -> Result<RetryOutcome<Vec<String>>> {
        let mut regexes = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            regexes.push(Regex::new(pattern).map_err(|e| {
                HarnessError::config(format!("bad marker pattern '{pattern}': {e}"))
            })?);
        }
        debug!(?patterns, path = %self.path.display(), "waiting for readiness markers");

        let mut matched: Vec<Option<String>> = vec![None; regexes.len()];
        policy
            .poll_until(|| {
                for line in self.read_new_lines()? {
                    for (slot, re) in matched.iter_mut().zip(&regexes) {
                        if slot.is_none() && re.is_match(&line) {
                            *slot = Some(line.clone());
                        }
                    }
                }
                if matched.iter().all(Option::is_some) {
                    Ok(Some(matched.iter().flatten().cloned().collect()))
                } else {
                    Ok(None)
                }
            })
            .await
    }
}
