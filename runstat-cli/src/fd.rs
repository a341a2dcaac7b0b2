// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Descriptor hygiene.
//!
//! Descriptors inherited from the parent would otherwise be passed on to
//! every measured child.

use std::ffi::OsStr;
use std::os::unix::io::RawFd;

const FD_DIR: &str = "/proc/self/fd";

/// Descriptor numbers above standard error among the entry names.
fn stray_fds<'a, I>(names: I) -> Vec<RawFd>
where
    I: IntoIterator<Item = &'a OsStr>,
{
    names
        .into_iter()
        .filter_map(|name| name.to_str()?.parse::<RawFd>().ok())
        .filter(|fd| *fd > 2)
        .collect()
}

/// Close every descriptor above 2. Must run before any file is opened.
pub fn close_inherited() {
    let entries = match std::fs::read_dir(FD_DIR) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(error = %e, "Cannot list open descriptors");
            return;
        }
    };

    let names: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect();
    // The directory handle itself is closed once `entries` is consumed; its
    // number may still be listed and then fails with EBADF.
    for fd in stray_fds(names.iter().map(|n| n.as_os_str())) {
        match nix::unistd::close(fd) {
            Ok(()) => tracing::debug!(fd, "Closed inherited descriptor"),
            Err(nix::errno::Errno::EBADF) => {}
            Err(e) => tracing::debug!(fd, error = %e, "Cannot close descriptor"),
        }
    }
}
