//! Cross-platform shell and executable-resolution utilities.

use std::{
    collections::HashSet,
    env::{join_paths, split_paths},
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

/// Resolve an executable by name, falling back to a refreshed PATH if needed.
///
/// The search order is:
/// 1. Explicit paths (absolute).
/// 2. The current process PATH via `which`.
/// 3. A platform-specific refresh of PATH (login shell on Unix, registry on
///    Windows), after which we re-run the `which` lookup and update the
///    process PATH for future calls.
pub fn resolve_executable_path(executable: &str) -> Option<PathBuf> {
    if executable.trim().is_empty() {
        return None;
    }

    let path = Path::new(executable);
    if path.is_absolute() && path.is_file() {
        return Some(path.to_path_buf());
    }

    if let Ok(found) = which::which(executable) {
        return Some(found);
    }

    if refresh_path() {
        if let Ok(found) = which::which(executable) {
            return Some(found);
        }
    }

    None
}

/// Merge two PATH strings into a single, de-duplicated PATH.
///
/// - Keeps the order of entries from `primary`.
/// - Appends only *unseen* entries from `secondary`.
/// - Ignores empty components.
pub fn merge_paths(primary: impl AsRef<OsStr>, secondary: impl AsRef<OsStr>) -> OsString {
    let mut seen = HashSet::<PathBuf>::new();
    let mut merged = Vec::<PathBuf>::new();

    for p in split_paths(primary.as_ref()).chain(split_paths(secondary.as_ref())) {
        if !p.as_os_str().is_empty() && seen.insert(p.clone()) {
            merged.push(p);
        }
    }

    join_paths(merged).unwrap_or_default()
}

fn refresh_path() -> bool {
    let Some(refreshed) = get_fresh_path() else {
        return false;
    };
    let existing = std::env::var_os("PATH").unwrap_or_default();
    let refreshed_os = OsString::from(&refreshed);
    let merged = merge_paths(&existing, refreshed_os);
    if merged == existing {
        return false;
    }
    tracing::debug!(?existing, ?refreshed, ?merged, "refreshed PATH");
    unsafe {
        std::env::set_var("PATH", &merged);
    }
    true
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnixShell {
    Zsh(PathBuf),
    Bash(PathBuf),
    Sh(PathBuf),
    Other(PathBuf),
}

impl UnixShell {
    pub fn path(&self) -> &Path {
        match self {
            UnixShell::Zsh(p) | UnixShell::Bash(p) | UnixShell::Sh(p) | UnixShell::Other(p) => p,
        }
    }
    pub fn login(&self) -> bool {
        matches!(self, UnixShell::Zsh(_) | UnixShell::Bash(_))
    }
    pub fn config_file(&self) -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        let config_file = match self {
            UnixShell::Zsh(_) => Some(home.join(".zshrc")),
            UnixShell::Bash(_) => Some(home.join(".bashrc")),
            UnixShell::Sh(_) | UnixShell::Other(_) => None,
        };
        config_file.filter(|p| p.is_file())
    }
    pub fn source_command(&self) -> Option<String> {
        let source_file = self.config_file()?;
        let escaped = shlex::try_quote(source_file.to_string_lossy().as_ref()).ok()?;
        Some(format!("source {escaped}"))
    }
    pub fn current_shell() -> UnixShell {
        if let Ok(shell) = std::env::var("SHELL") {
            if let Some(shell) = UnixShell::from_path(Path::new(&shell)) {
                return shell;
            }
        }
        UnixShell::Sh(PathBuf::from("/bin/sh"))
    }
    pub fn from_path(path: &Path) -> Option<UnixShell> {
        if path.is_absolute() && path.is_file() {
            let path_buf = path.to_path_buf();
            if path.file_name() == Some(OsStr::new("zsh")) {
                Some(UnixShell::Zsh(path_buf))
            } else if path.file_name() == Some(OsStr::new("bash")) {
                Some(UnixShell::Bash(path_buf))
            } else if path.file_name() == Some(OsStr::new("sh")) {
                Some(UnixShell::Sh(path_buf))
            } else {
                Some(UnixShell::Other(path_buf))
            }
        } else {
            None
        }
    }
}

#[cfg(not(windows))]
fn get_fresh_path() -> Option<String> {
    use std::{process::Stdio, time::Duration};

    fn run(shell: &UnixShell) -> Option<String> {
        let mut cmd = std::process::Command::new(shell.path());
        if shell.login() {
            cmd.arg("-l");
        }
        if let Some(source_command) = shell.source_command() {
            cmd.arg("-c")
                .arg(format!("{source_command}; printf '%s' \"$PATH\""));
        } else {
            cmd.arg("-c").arg("printf '%s' \"$PATH\"");
        }
        cmd.env("TERM", "dumb")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().ok()?;
        let timeout = Duration::from_secs(5);
        let start = std::time::Instant::now();
        loop {
            if let Ok(Some(_)) = child.try_wait() {
                break;
            }
            if start.elapsed() > timeout {
                let _ = child.kill();
                tracing::warn!(shell = %shell.path().display(), "timed out retrieving PATH from login shell");
                return None;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            return None;
        }
        let path = String::from_utf8(output.stdout).ok()?.trim().to_string();
        if path.is_empty() { None } else { Some(path) }
    }

    let mut paths = Vec::new();
    let current_shell = UnixShell::current_shell();
    if let Some(path) = run(&current_shell) {
        paths.push(path);
    }
    let shells: Vec<UnixShell> = ["/bin/zsh", "/bin/bash", "/bin/sh"]
        .into_iter()
        .filter_map(|p| UnixShell::from_path(Path::new(p)))
        .collect();
    for shell in shells {
        if shell != current_shell {
            if let Some(path) = run(&shell) {
                paths.push(path);
            }
        }
    }

    if paths.is_empty() {
        return None;
    }
    paths
        .into_iter()
        .map(OsString::from)
        .reduce(|a, b| merge_paths(&a, &b))
        .map(|merged| merged.to_string_lossy().into_owned())
}

#[cfg(windows)]
fn get_fresh_path() -> Option<String> {
    use std::{
        ffi::{OsStr, OsString},
        os::windows::ffi::{OsStrExt, OsStringExt},
    };

    use winreg::{HKEY, RegKey, enums::*};

    fn expand_env_vars(input: &OsStr) -> OsString {
        use windows_sys::Win32::System::Environment::ExpandEnvironmentStringsW;

        let wide: Vec<u16> = input.encode_wide().chain(Some(0)).collect();
        unsafe {
            let needed = ExpandEnvironmentStringsW(wide.as_ptr(), std::ptr::null_mut(), 0);
            if needed == 0 {
                return input.to_os_string();
            }
            let mut buf = vec![0u16; needed as usize];
            let written = ExpandEnvironmentStringsW(wide.as_ptr(), buf.as_mut_ptr(), needed);
            if written == 0 {
                return input.to_os_string();
            }
            OsString::from_wide(&buf[..(written as usize).saturating_sub(1)])
        }
    }

    fn read_registry_path(root: HKEY, subkey: &str) -> Option<OsString> {
        let key = RegKey::predef(root)
            .open_subkey_with_flags(subkey, KEY_READ)
            .ok()?;
        key.get_value::<String, _>("Path").ok().map(OsString::from)
    }

    let mut paths: Vec<OsString> = Vec::new();
    if let Some(user_path) = read_registry_path(HKEY_CURRENT_USER, "Environment") {
        paths.push(expand_env_vars(&user_path));
    }
    if let Some(machine_path) = read_registry_path(
        HKEY_LOCAL_MACHINE,
        r"System\CurrentControlSet\Control\Session Manager\Environment",
    ) {
        paths.push(expand_env_vars(&machine_path));
    }

    if paths.is_empty() {
        return None;
    }
    paths
        .into_iter()
        .reduce(|a, b| merge_paths(&a, &b))
        .map(|merged| merged.to_string_lossy().into_owned())
}
