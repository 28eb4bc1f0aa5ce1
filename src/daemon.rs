//! detaches the process from its controlling terminal.

use {
    std::{
        fmt::{self, Display},
        io::{self, Write},
    },
    tracing::{info, warn},
};

#[derive(Debug)]
pub enum DetachError {
    /// the child process could not be created.
    Fork(io::Error),
    /// the child could not start a new session.
    Session(io::Error),
}

/// forks, leaving the child running as a daemon in a new session.
///
/// the parent reports the child's pid and exits. in the child, the file creation mask is
/// cleared, the working directory optionally moves to `/`, and the standard streams are closed.
/// nothing may be written to them afterwards.
///
/// this must be called while the process has a single thread.
pub fn detach(chdir_to_root: bool) -> Result<(), DetachError> {
    // SAFETY: the process is single-threaded, so the child inherits a consistent address space.
    match unsafe { libc::fork() } {
        -1 => return Err(DetachError::Fork(io::Error::last_os_error())),
        0 => {}
        child => {
            info!(%child, "forked");
            // the parent exits either way, so a closed stdout is not an error.
            let _ = writeln!(io::stdout(), "cpu-usage running now in the background: {child}");
            std::process::exit(0);
        }
    }

    // SAFETY: `umask` cannot fail.
    unsafe { libc::umask(0) };

    // SAFETY: `setsid` has no preconditions; failure is reported through its return value.
    if unsafe { libc::setsid() } < 0 {
        return Err(DetachError::Session(io::Error::last_os_error()));
    }

    if chdir_to_root {
        if let Err(error) = std::env::set_current_dir("/") {
            warn!(%error, "could not change to the root directory");
        }
    }

    for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: the standard streams are not used after this point.
        unsafe { libc::close(fd) };
    }

    Ok(())
}

// === impl DetachError ===

impl Display for DetachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fork(error) => f.write_fmt(format_args!("fork failed: {error}")),
            Self::Session(error) => f.write_fmt(format_args!("setsid failed: {error}")),
        }
    }
}

impl std::error::Error for DetachError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fork(error) | Self::Session(error) => Some(error),
        }
    }
}
