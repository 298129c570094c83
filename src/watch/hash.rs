// src/watch/hash.rs

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use blake3::Hasher;
use tracing::{debug, trace};

use crate::fs::FileSystem;

/// Content checksum stored per file in the content cache.
pub type Checksum = blake3::Hash;

/// Read buffer size when streaming a file through the hasher.
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Hash a file's contents in fixed-size blocks.
pub fn compute_checksum(fs: &dyn FileSystem, path: &Path) -> Result<Checksum> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = vec![0u8; BLOCK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// How long to wait for a freshly created file to stop growing.
///
/// This is a heuristic: a writer that pauses for longer than
/// `poll_interval * stable_polls` is indistinguishable from one that has
/// finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub poll_interval: Duration,
    /// Consecutive polls with an unchanged size that count as settled.
    pub stable_polls: u32,
    /// Hard upper bound on polls. Reaching it is not an error; the current
    /// size is used.
    pub max_polls: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            stable_polls: 2,
            max_polls: 50,
        }
    }
}

/// Poll a file's size until it has been unchanged for `stable_polls`
/// consecutive polls, or `max_polls` is reached. Returns the last size seen.
pub async fn wait_for_stable(
    fs: &dyn FileSystem,
    path: &Path,
    policy: &SettlePolicy,
) -> Result<u64> {
    let mut last = fs.file_size(path)?;
    let mut stable = 0u32;
    let mut polls = 0u32;

    while stable < policy.stable_polls {
        if polls >= policy.max_polls {
            debug!(?path, size = last, polls, "file did not settle; using current size");
            return Ok(last);
        }
        tokio::time::sleep(policy.poll_interval).await;
        polls += 1;

        let size = match fs.file_size(path) {
            Ok(size) => size,
            Err(e) => bail!("file vanished while settling: {e:#}"),
        };
        if size == last {
            stable += 1;
        } else {
            trace!(?path, from = last, to = size, "file still growing");
            stable = 0;
            last = size;
        }
    }

    Ok(last)
}

