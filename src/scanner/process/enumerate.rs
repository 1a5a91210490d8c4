//! Process enumeration and termination.
//!
//! Provides cross-platform process listing with command lines, plus the
//! forced kill used before removing a file that a process holds open.

use crate::core::error::{Error, Result};
use crate::scanner::process::ProcessSource;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use sysinfo::{Pid, ProcessStatus, System};

/// Information about a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: u32,
    /// Process (executable) name
    pub name: String,
    /// Full path to executable
    pub path: Option<PathBuf>,
    /// Command line, one element per argument
    pub args: Vec<String>,
}

impl ProcessInfo {
    /// Create a new process info entry.
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            path: None,
            args: Vec::new(),
        }
    }

    /// Set the executable path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the command line arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Live process table of the host.
pub struct ProcessEnumerator {
    system: Mutex<System>,
}

impl Default for ProcessEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessEnumerator").finish_non_exhaustive()
    }
}

impl ProcessEnumerator {
    /// Create a new process enumerator.
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        // The table is rebuilt on every refresh.
        self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enumerate all running processes, ordered by pid.
    ///
    /// Processes that exit while the table is read are omitted.
    pub fn enumerate(&self) -> Result<Vec<ProcessInfo>> {
        let mut system = self.system();
        system.refresh_processes();

        let mut processes: Vec<ProcessInfo> = system
            .processes()
            .iter()
            .filter(|(_, p)| is_running_status(p.status()))
            .map(|(pid, p)| process_info(pid.as_u32(), p.name(), p.exe(), p.cmd()))
            .collect();
        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }

    /// Whether `pid` still refers to a live process.
    ///
    /// A zombie awaiting its parent is treated as gone.
    pub fn is_alive(&self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        let mut system = self.system();
        if !system.refresh_process(pid) {
            return false;
        }
        system
            .process(pid)
            .is_some_and(|p| is_running_status(p.status()))
    }

    /// Send a forced kill to `pid`. Does not wait for exit.
    pub fn kill(&self, pid: u32) -> Result<()> {
        let target = Pid::from_u32(pid);
        let mut system = self.system();
        if !system.refresh_process(target) {
            return Err(Error::ProcessNotFound(pid));
        }
        match system.process(target) {
            Some(process) if process.kill() => Ok(()),
            Some(_) => Err(Error::ProcessTermination {
                pid,
                reason: "kill request was rejected".to_string(),
            }),
            None => Err(Error::ProcessNotFound(pid)),
        }
    }
}

impl ProcessSource for ProcessEnumerator {
    fn snapshot(&self) -> Result<Vec<ProcessInfo>> {
        self.enumerate()
    }

    fn is_alive(&self, pid: u32) -> bool {
        ProcessEnumerator::is_alive(self, pid)
    }

    fn kill(&self, pid: u32) -> Result<()> {
        ProcessEnumerator::kill(self, pid)
    }
}

fn is_running_status(status: ProcessStatus) -> bool {
    !matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

/// Build a [`ProcessInfo`] from one process table row.
///
/// The executable's file name wins over the reported name, which Linux
/// truncates to 15 bytes.
fn process_info(pid: u32, name: &str, exe: Option<&Path>, cmd: &[String]) -> ProcessInfo {
    let exe_name = exe
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned());

    let mut info = ProcessInfo::new(pid, exe_name.unwrap_or_else(|| name.to_string()))
        .with_args(cmd.iter().cloned());
    info.path = exe.map(Path::to_path_buf);
    info
}

/// Forcefully terminate a process by PID.
///
/// Used to release file handles before deletion.
pub fn terminate_process(pid: u32) -> Result<()> {
    ProcessEnumerator::new().kill(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_process_info_builders() {
        let info = ProcessInfo::new(1234, "java")
            .with_path("/usr/bin/java")
            .with_args(["java", "-jar", "wurst.jar"]);
        assert_eq!(info.pid, 1234);
        assert_eq!(info.path, Some(PathBuf::from("/usr/bin/java")));
        assert_eq!(info.args.len(), 3);
    }

    #[test]
    fn test_process_info_keeps_spaces() {
        let exe = Path::new("/Applications/Foo Bar.app/Contents/MacOS/Foo Bar");
        let cmd = vec![
            exe.to_string_lossy().into_owned(),
            "--mods".to_string(),
            "/Users/a/My Mods/vape.jar".to_string(),
        ];
        let info = process_info(77, "Foo", Some(exe), &cmd);

        assert_eq!(info.name, "Foo Bar");
        assert_eq!(info.path.as_deref(), Some(exe));
        assert_eq!(info.args, cmd);
    }

    #[test]
    fn test_process_info_falls_back_to_name() {
        let info = process_info(4, "System", None, &[]);
        assert_eq!(info.name, "System");
        assert!(info.path.is_none());
        assert!(info.args.is_empty());
    }

    #[test]
    fn test_zombies_are_not_running() {
        assert!(!is_running_status(ProcessStatus::Zombie));
        assert!(!is_running_status(ProcessStatus::Dead));
        assert!(is_running_status(ProcessStatus::Run));
        assert!(is_running_status(ProcessStatus::Sleep));
    }

    #[test]
    fn test_enumerate_finds_self() {
        let processes = ProcessEnumerator::new().enumerate().unwrap();
        let current_pid = std::process::id();
        assert!(processes.iter().any(|p| p.pid == current_pid));
        assert!(processes.windows(2).all(|w| w[0].pid < w[1].pid));
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_spawned_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        let enumerator = ProcessEnumerator::new();
        assert!(enumerator.is_alive(pid));

        ProcessSource::kill(&enumerator, pid).unwrap();
        // Unreaped children linger as zombies and must read as gone.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while enumerator.is_alive(pid) && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(!enumerator.is_alive(pid));
        let _ = child.wait();
    }

    #[test]
    fn test_unknown_pid() {
        let enumerator = ProcessEnumerator::new();
        assert!(!enumerator.is_alive(u32::MAX - 1));
        assert!(matches!(
            enumerator.kill(u32::MAX - 1),
            Err(Error::ProcessNotFound(_))
        ));
    }
}
