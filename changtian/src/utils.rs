//! Command execution and filesystem helpers.
//!
//! This module provides the [`Command`] wrapper used for every external
//! program changtian runs, plus a few small filesystem utilities shared by
//! the build steps.

use std::{
    ffi::OsStr,
    fs, io,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    process::{ExitStatus, Output},
    sync::LazyLock,
    time::Duration,
};

use anyhow::{Context, bail};
use colored::Colorize;
use regex::{Captures, Regex};

/// How much of captured output is echoed after a command finishes.
pub const OUTPUT_TAIL_CHARS: usize = 500;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{env:([^}]*)\}").expect("static regex is valid"));

/// A command builder wrapper with variable substitution and a timeout.
///
/// `Command` wraps `tokio::process::Command`. Arguments and environment
/// values go through the substitution function before they are stored, and
/// every way of running the command is bounded by the configured timeout.
/// The child is killed if the timeout fires.
pub struct Command {
    inner: tokio::process::Command,
    value_replace: Box<dyn Fn(&OsStr) -> String + Send + Sync>,
    timeout: Option<Duration>,
}

impl Deref for Command {
    type Target = tokio::process::Command;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Command {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Command {
    /// Creates a new command builder.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to execute.
    /// * `workdir` - The working directory for the command.
    /// * `value_replace` - Function to perform variable substitution on arguments.
    pub fn new<S>(
        program: S,
        workdir: &Path,
        value_replace: impl Fn(&OsStr) -> String + Send + Sync + 'static,
    ) -> Command
    where
        S: AsRef<OsStr>,
    {
        let mut cmd = tokio::process::Command::new(program);
        cmd.current_dir(workdir);
        cmd.kill_on_drop(true);

        Self {
            inner: cmd,
            value_replace: Box::new(value_replace),
            timeout: None,
        }
    }

    /// Limits how long the command may run.
    pub fn timeout(&mut self, limit: Duration) -> &mut Command {
        self.timeout = Some(limit);
        self
    }

    /// The program and its arguments joined by spaces.
    pub fn cmd_string(&self) -> String {
        let std = self.inner.as_std();
        let mut cmd_str = std.get_program().to_string_lossy().to_string();

        for arg in std.get_args() {
            cmd_str += " ";
            cmd_str += arg.to_string_lossy().as_ref();
        }
        cmd_str
    }

    /// Prints the command to stdout with colored formatting.
    pub fn print_cmd(&self) {
        println!("{}", self.cmd_string().purple().bold());
    }

    /// Runs the command with inherited stdio and fails on a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started, times out, or
    /// exits with a non-zero status.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let status = self.status().await?;
        if !status.success() {
            bail!("`{}` failed with status: {status}", self.cmd_string());
        }
        Ok(())
    }

    /// Runs the command with inherited stdio and returns its exit status.
    ///
    /// A non-zero exit is not an error here.
    pub async fn status(&mut self) -> anyhow::Result<ExitStatus> {
        self.print_cmd();
        let cmd = self.cmd_string();
        let limit = self.timeout;
        with_timeout(limit, &cmd, self.inner.status()).await
    }

    /// Runs the command with captured output.
    ///
    /// The last [`OUTPUT_TAIL_CHARS`] characters of stdout and stderr are
    /// logged. A non-zero exit is not an error here.
    pub async fn output(&mut self) -> anyhow::Result<Output> {
        self.print_cmd();
        let cmd = self.cmd_string();
        let limit = self.timeout;
        let output = with_timeout(limit, &cmd, self.inner.output()).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            info!("stdout: {}", tail_chars(&stdout, OUTPUT_TAIL_CHARS));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            info!("stderr: {}", tail_chars(&stderr, OUTPUT_TAIL_CHARS));
        }
        Ok(output)
    }

    /// Adds an argument to the command with variable substitution.
    pub fn arg<S>(&mut self, arg: S) -> &mut Command
    where
        S: AsRef<OsStr>,
    {
        let value = (self.value_replace)(arg.as_ref());
        self.inner.arg(value);
        self
    }

    /// Adds multiple arguments to the command with variable substitution.
    pub fn args<I, S>(&mut self, args: I) -> &mut Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg.as_ref());
        }
        self
    }

    /// Sets an environment variable for the command with variable substitution.
    pub fn env<K, V>(&mut self, key: K, val: V) -> &mut Command
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let value = (self.value_replace)(val.as_ref());
        self.inner.env(key, value);
        self
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    cmd: &str,
    fut: impl Future<Output = io::Result<T>>,
) -> anyhow::Result<T> {
    let res = match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => bail!("`{cmd}` timed out after {}s", limit.as_secs()),
        },
        None => fut.await,
    };
    res.with_context(|| format!("failed to run `{cmd}`"))
}

/// Returns at most the last `max` characters of `s`.
pub fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = s
        .char_indices()
        .nth(count - max)
        .map_or(s.len(), |(i, _)| i);
    &s[skip..]
}

/// Replaces environment variable placeholders in a string.
///
/// Placeholders use the format `${env:VAR_NAME}`. An unset variable is
/// replaced with an empty string. Other `${...}` forms are left untouched.
///
/// # Example
///
/// ```rust
/// use changtian::utils::replace_env_placeholders;
///
/// unsafe { std::env::set_var("CT_DOC_VAR", "hello"); }
/// let result = replace_env_placeholders("Value: ${env:CT_DOC_VAR}");
/// assert_eq!(result, "Value: hello");
/// ```
pub fn replace_env_placeholders(input: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => {
                    debug!("Using {name}={value}");
                    value
                }
                Err(_) => String::new(),
            }
        })
        .into_owned()
}

/// Lists all regular files below `dir`, depth first.
///
/// Symbolic links are not followed. A missing `dir` yields an empty list;
/// directories that cannot be read for lack of permission are skipped.
pub fn walk_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !dir.is_dir() {
        return Ok(out);
    }

    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let read_dir = match fs::read_dir(&current) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                warn!("Skipping {}: {e}", current.display());
                continue;
            }
            Err(e) => return Err(e),
        };
        let mut entries = read_dir.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries.into_iter().rev() {
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() {
                out.push(entry.path());
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Recursively copies `src` into `dst`, creating `dst` as needed.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Sets mode `0755` on `path`. Does nothing on non-Unix hosts.
pub fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
