// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocks the caller until the log file has likely grown.
//!
//! On Linux, watches the file via `inotify` through raw `libc` syscalls,
//! bounded by `poll(2)`. On any other host, falls back to a doubling
//! polling back-off (10 ms to a 100 ms cap), matching the fallback this
//! crate uses for its other platform-specific kernel primitives.

use std::path::{Path, PathBuf};
use std::time::Duration;

const POLL_MIN_INTERVAL: Duration = Duration::from_millis(10);
const POLL_MAX_INTERVAL: Duration = Duration::from_millis(100);

/// Suspends the caller until the tailed file is likely modified.
pub enum Tailer {
    #[cfg(target_os = "linux")]
    Inotify(inotify::InotifyTailer),
    Polling(PollingTailer),
}

impl Tailer {
    /// Initialize a tailer for `path`. Prefers the native notification
    /// primitive where available.
    pub fn init(path: &Path) -> std::io::Result<Self> {
        #[cfg(target_os = "linux")]
        {
            match inotify::InotifyTailer::init(path) {
                Ok(t) => return Ok(Tailer::Inotify(t)),
                Err(e) => {
                    tracing::warn!("inotify init failed ({e}), falling back to polling");
                }
            }
        }
        Ok(Tailer::Polling(PollingTailer::init(path)?))
    }

    /// Block until the file is likely modified, or `timeout_ms` elapses.
    /// `0` means block indefinitely. Returns whether a modification was
    /// observed (`false` on timeout).
    pub fn wait_for_modification(&mut self, timeout_ms: u64) -> std::io::Result<bool> {
        match self {
            #[cfg(target_os = "linux")]
            Tailer::Inotify(t) => t.wait_for_modification(timeout_ms),
            Tailer::Polling(t) => t.wait_for_modification(timeout_ms),
        }
    }
}

/// Doubling-backoff polling fallback for hosts without a native
/// file-modification notification primitive.
pub struct PollingTailer {
    path: PathBuf,
    last_size: u64,
    interval: Duration,
}

impl PollingTailer {
    pub fn init(path: &Path) -> std::io::Result<Self> {
        let last_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path: path.to_path_buf(),
            last_size,
            interval: POLL_MIN_INTERVAL,
        })
    }

    pub fn wait_for_modification(&mut self, timeout_ms: u64) -> std::io::Result<bool> {
        let deadline = if timeout_ms == 0 {
            None
        } else {
            Some(std::time::Instant::now() + Duration::from_millis(timeout_ms))
        };

        loop {
            let size = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(self.last_size);
            if size > self.last_size {
                self.last_size = size;
                self.interval = POLL_MIN_INTERVAL;
                return Ok(true);
            }

            if let Some(deadline) = deadline {
                if std::time::Instant::now() >= deadline {
                    return Ok(false);
                }
            }

            std::thread::sleep(self.interval);
            self.interval = (self.interval * 2).min(POLL_MAX_INTERVAL);
        }
    }
}

#[cfg(target_os = "linux")]
mod inotify {
    use super::*;
    use std::ffi::CString;
    use std::os::unix::io::RawFd;

    /// Raw-syscall `inotify` watcher. Modeled on this crate's direct-libc
    /// style for other OS-level primitives: no ergonomic wrapper crate,
    /// just the syscalls needed for a single watched path.
    pub struct InotifyTailer {
        fd: RawFd,
        _watch: i32,
    }

    impl InotifyTailer {
        pub fn init(path: &Path) -> std::io::Result<Self> {
            // SAFETY: inotify_init1 takes no pointers; IN_NONBLOCK keeps
            // reads from blocking so `poll` governs the wait instead.
            let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK) };
            if fd < 0 {
                return Err(std::io::Error::last_os_error());
            }

            let c_path = CString::new(path.to_string_lossy().as_bytes())
                .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "nul in path"))?;

            // SAFETY: fd is the just-created valid inotify descriptor;
            // c_path is a valid nul-terminated C string for the syscall's
            // duration.
            let watch = unsafe {
                libc::inotify_add_watch(
                    fd,
                    c_path.as_ptr(),
                    (libc::IN_MODIFY | libc::IN_CLOSE_WRITE) as u32,
                )
            };
            if watch < 0 {
                let err = std::io::Error::last_os_error();
                // SAFETY: fd is open and owned exclusively by this call.
                unsafe { libc::close(fd) };
                return Err(err);
            }

            Ok(Self { fd, _watch: watch })
        }

        pub fn wait_for_modification(&mut self, timeout_ms: u64) -> std::io::Result<bool> {
            let poll_timeout = if timeout_ms == 0 { -1 } else { timeout_ms as i32 };
            let mut fds = [libc::pollfd {
                fd: self.fd,
                events: libc::POLLIN,
                revents: 0,
            }];

            // SAFETY: fds points at a single valid pollfd for the call's
            // duration; nfds matches the array length.
            let ready = unsafe { libc::poll(fds.as_mut_ptr(), 1, poll_timeout) };
            if ready < 0 {
                return Err(std::io::Error::last_os_error());
            }
            if ready == 0 {
                return Ok(false);
            }

            self.drain_events()?;
            Ok(true)
        }

        fn drain_events(&mut self) -> std::io::Result<()> {
            let mut buf = [0u8; 4096];
            loop {
                // SAFETY: buf is a valid, exclusively-owned buffer of the
                // given length; fd is the open inotify descriptor.
                let n = unsafe {
                    libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
                };
                if n < 0 {
                    let err = std::io::Error::last_os_error();
                    if err.kind() == std::io::ErrorKind::WouldBlock {
                        return Ok(());
                    }
                    return Err(err);
                }
                if n == 0 {
                    return Ok(());
                }
                if (n as usize) < buf.len() {
                    return Ok(());
                }
            }
        }
    }

    impl Drop for InotifyTailer {
        fn drop(&mut self) {
            // SAFETY: fd is owned exclusively by this struct and not
            // closed anywhere else.
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn polling_tailer_detects_growth() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.bin");
        std::fs::write(&path, b"").expect("create");

        let mut tailer = PollingTailer::init(&path).expect("init");

        let path_clone = path.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            let mut f = std::fs::OpenOptions::new().append(true).open(&path_clone).expect("open");
            f.write_all(b"grown").expect("write");
        });

        let modified = tailer.wait_for_modification(1000).expect("wait");
        assert!(modified);
        handle.join().unwrap();
    }

    #[test]
    fn polling_tailer_times_out_without_growth() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.bin");
        std::fs::write(&path, b"").expect("create");

        let mut tailer = PollingTailer::init(&path).expect("init");
        let modified = tailer.wait_for_modification(50).expect("wait");
        assert!(!modified);
    }

    #[test]
    fn tailer_init_picks_a_working_backend() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.bin");
        std::fs::write(&path, b"").expect("create");

        let mut tailer = Tailer::init(&path).expect("init");
        let modified = tailer.wait_for_modification(50).expect("wait");
        assert!(!modified);
    }
}
