//! Thin wrappers over the process-group syscalls used by the launcher and registry.

use std::io;

/// What a termination signal is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillTarget {
    Group(u32),
    Process(u32),
}

impl KillTarget {
    pub fn id(&self) -> u32 {
        match self {
            KillTarget::Group(id) | KillTarget::Process(id) => *id,
        }
    }
}

/// Detach the calling process into a new session, making it a group leader.
/// Meant to run between fork and exec.
pub fn new_session() -> io::Result<()> {
    // SAFETY: setsid is async-signal-safe and takes no pointers
    if unsafe { libc::setsid() } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Process group of `pid`
pub fn process_group_of(pid: u32) -> io::Result<u32> {
    // SAFETY: plain syscall on an integer argument
    let pgid = unsafe { libc::getpgid(pid as libc::pid_t) };
    if pgid == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(pgid as u32)
}

/// Send SIGTERM to `target`.
///
/// A target that no longer exists surfaces as `ErrorKind::NotFound`.
pub fn terminate(target: KillTarget) -> io::Result<()> {
    // SAFETY: plain syscalls on integer arguments
    let rc = match target {
        KillTarget::Group(pgid) => unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGTERM) },
        KillTarget::Process(pid) => unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) },
    };
    if rc == -1 {
        return Err(not_found_on_esrch(io::Error::last_os_error()));
    }
    Ok(())
}

/// Whether any process in `target` still exists
pub fn is_alive(target: KillTarget) -> bool {
    // SAFETY: signal 0 only performs the existence and permission check
    let rc = match target {
        KillTarget::Group(pgid) => unsafe { libc::killpg(pgid as libc::pid_t, 0) },
        KillTarget::Process(pid) => unsafe { libc::kill(pid as libc::pid_t, 0) },
    };
    if rc == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

fn not_found_on_esrch(error: io::Error) -> io::Error {
    if error.raw_os_error() == Some(libc::ESRCH) {
        io::Error::new(io::ErrorKind::NotFound, error)
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_process_is_alive() {
        let pid = std::process::id();
        assert!(is_alive(KillTarget::Process(pid)));
        assert!(process_group_of(pid).is_ok());
    }

    #[test]
    fn test_missing_process() {
        // Above the default pid_max on Linux
        let pid = 4_194_304 + 17;
        assert!(!is_alive(KillTarget::Process(pid)));
        let err = terminate(KillTarget::Group(pid)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(process_group_of(pid).is_err());
    }
}
