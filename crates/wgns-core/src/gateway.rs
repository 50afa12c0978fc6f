//! Invocation of the `ip` tool.
//!
//! One [`CommandGateway::execute`] call runs exactly one process, in JSON
//! mode, optionally scoped to a namespace. The gateway never interprets a
//! failure; the component that issued the command decides what it means.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use nix::errno::Errno;
use serde_json::Value;
use wgns_common::config::WgnsConfig;
use wgns_common::error::WgnsError;
use wgns_common::types::NamespaceName;

/// Kernel errors recognised in diagnostic text, most specific first.
const RECOGNISED_ERRNOS: &[Errno] = &[
    Errno::EEXIST,
    Errno::EPERM,
    Errno::EACCES,
    Errno::ENODEV,
    Errno::ENOENT,
    Errno::ENETUNREACH,
    Errno::EHOSTUNREACH,
    Errno::EADDRNOTAVAIL,
    Errno::EBUSY,
    Errno::EINVAL,
];

/// Successful output of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// The command succeeded and printed nothing.
    Completed,
    /// The command succeeded and printed a JSON document.
    Structured(Value),
}

impl CommandOutput {
    /// Returns the JSON array items, or nothing for [`CommandOutput::Completed`]
    /// and non-array documents.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        match self {
            Self::Structured(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Returns string field `field` of the first item.
    #[must_use]
    pub fn first_str(&self, field: &str) -> Option<&str> {
        self.items().first()?.get(field)?.as_str()
    }
}

/// A non-zero exit (or a failure to run at all) with the raw diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Rendered command line, without standard input.
    pub command: String,
    /// Diagnostic text, usually the tool's stderr.
    pub message: String,
}

impl CommandFailure {
    /// Creates a failure record.
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Decodes the kernel error phrase carried in the diagnostic text.
    #[must_use]
    pub fn errno(&self) -> Option<Errno> {
        RECOGNISED_ERRNOS
            .iter()
            .copied()
            .find(|errno| self.message.contains(errno.desc()))
    }

    /// Returns `true` if the diagnostic reports `errno`.
    #[must_use]
    pub fn is(&self, errno: Errno) -> bool {
        self.errno() == Some(errno)
    }

    /// Returns `true` if the diagnostic contains a tool-specific phrase.
    #[must_use]
    pub fn mentions(&self, phrase: &str) -> bool {
        self.message.contains(phrase)
    }

    /// Converts into the generic error, reporting privilege failures as
    /// [`WgnsError::PermissionDenied`].
    ///
    /// Callers handle their operation-specific conditions first and fall
    /// back to this.
    #[must_use]
    pub fn into_error(self) -> WgnsError {
        match self.errno() {
            Some(Errno::EPERM | Errno::EACCES) => WgnsError::PermissionDenied {
                message: format!("{}: {}", self.command, self.message),
            },
            _ => WgnsError::CommandFailed {
                command: self.command,
                message: self.message,
            },
        }
    }
}

/// Outcome of one invocation.
pub type CommandResult = std::result::Result<CommandOutput, CommandFailure>;

/// Runs network configuration commands.
///
/// Production code uses [`IpGateway`]; tests substitute an in-memory kernel.
pub trait CommandGateway: Send + Sync {
    /// Runs `ip -j [-n <namespace>] <argv...>`, feeding `stdin` if given.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandFailure`] on non-zero exit, spawn failure, or
    /// output that is not JSON.
    fn execute(
        &self,
        argv: &[&str],
        namespace: Option<&NamespaceName>,
        stdin: Option<&[u8]>,
    ) -> CommandResult;
}

/// Gateway that spawns the `ip` executable.
#[derive(Debug, Clone)]
pub struct IpGateway {
    ip_path: PathBuf,
    debug: bool,
}

impl IpGateway {
    /// Creates a gateway using the executable and debug flag from `config`.
    #[must_use]
    pub fn new(config: &WgnsConfig) -> Self {
        Self {
            ip_path: config.ip_path.clone(),
            debug: config.debug,
        }
    }

    fn arguments(argv: &[&str], namespace: Option<&NamespaceName>) -> Vec<String> {
        let mut args = Vec::with_capacity(argv.len() + 3);
        args.push("-j".to_string());
        if let Some(ns) = namespace {
            args.push("-n".to_string());
            args.push(ns.as_str().to_string());
        }
        args.extend(argv.iter().map(ToString::to_string));
        args
    }
}

impl CommandGateway for IpGateway {
    fn execute(
        &self,
        argv: &[&str],
        namespace: Option<&NamespaceName>,
        stdin: Option<&[u8]>,
    ) -> CommandResult {
        let args = Self::arguments(argv, namespace);
        let rendered = format!("{} {}", self.ip_path.display(), args.join(" "));
        tracing::debug!(command = %rendered, with_stdin = stdin.is_some(), "running ip");

        let mut child = Command::new(&self.ip_path)
            .args(&args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandFailure::new(&rendered, format!("failed to start: {e}")))?;

        // The child is reaped even when feeding it fails.
        let write_error = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe.write_all(input).err(),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| CommandFailure::new(&rendered, format!("failed to wait: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if self.debug {
            tracing::debug!(command = %rendered, status = %output.status, %stdout, %stderr, "ip finished");
        } else {
            tracing::trace!(command = %rendered, status = %output.status, %stdout, %stderr, "ip finished");
        }

        if let Some(message) = failure_message(&output.status, &stderr, write_error.as_ref()) {
            return Err(CommandFailure::new(rendered, message));
        }

        parse_output(&stdout)
            .map_err(|e| CommandFailure::new(rendered, format!("unparseable output: {e}")))
    }
}

/// Describes why a finished invocation failed, or `None` if it succeeded.
///
/// The tool's own diagnostic wins over a failed stdin write.
fn failure_message(
    status: &ExitStatus,
    stderr: &str,
    write_error: Option<&io::Error>,
) -> Option<String> {
    let stderr = stderr.trim();
    if !stderr.is_empty() && !status.success() {
        return Some(stderr.to_string());
    }
    if let Some(e) = write_error {
        return Some(format!("failed to write stdin: {e}"));
    }
    (!status.success()).then(|| format!("exited with {status}"))
}

/// Parses `ip -j` standard output.
///
/// # Errors
///
/// Returns the JSON error if non-blank output is not valid JSON.
pub fn parse_output(stdout: &str) -> serde_json::Result<CommandOutput> {
    if stdout.trim().is_empty() {
        return Ok(CommandOutput::Completed);
    }
    serde_json::from_str(stdout).map(CommandOutput::Structured)
}
