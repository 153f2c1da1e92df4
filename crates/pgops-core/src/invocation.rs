//! External tool invocation.
//!
//! Every call to psql, pg_dump, pg_restore or dbmate is described by an
//! [`InvocationSpec`] (executable plus discrete arguments, never a shell
//! string) and executed by a [`ToolRunner`]. [`SystemRunner`] spawns real
//! processes with tokio; tests substitute a recording runner.

use std::{
    fmt,
    fs::File,
    io,
    path::PathBuf,
    process::{ExitStatus, Stdio},
    sync::Arc,
};

use log::debug;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    sync::Notify,
};

use crate::error::{OpsError, Result};

/// The role an executable plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Psql,
    PgDump,
    PgRestore,
    Dbmate,
}

impl ToolKind {
    /// All tool roles, in the order they are checked.
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Psql,
        ToolKind::PgDump,
        ToolKind::PgRestore,
        ToolKind::Dbmate,
    ];

    /// Default executable name.
    pub fn default_program(&self) -> &'static str {
        match self {
            ToolKind::Psql => "psql",
            ToolKind::PgDump => "pg_dump",
            ToolKind::PgRestore => "pg_restore",
            ToolKind::Dbmate => "dbmate",
        }
    }

    /// Installation guidance shown when the executable is missing.
    pub fn install_hint(&self) -> &'static str {
        match self {
            ToolKind::Psql | ToolKind::PgDump | ToolKind::PgRestore => {
                "Install the PostgreSQL client tools (e.g. `apt install postgresql-client` \
                 or `brew install libpq`) and make sure they are on PATH."
            }
            ToolKind::Dbmate => {
                "Install dbmate (https://github.com/amacneil/dbmate#installation) \
                 and make sure `dbmate` is on PATH."
            }
        }
    }
}

/// Where a captured invocation reads standard input from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    #[default]
    Null,
    File(PathBuf),
}

/// Where a captured invocation writes standard output to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Capture,
    File(PathBuf),
}

/// A single external process call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub tool: ToolKind,
    pub program: String,
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment
    pub env: Vec<(String, String)>,
    pub stdin: Input,
    pub stdout: Output,
    /// Hide the `-c` statement from log output
    pub secret: bool,
}

impl InvocationSpec {
    pub fn new(tool: ToolKind, program: impl Into<String>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: Input::Null,
            stdout: Output::Capture,
            secret: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(vars);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Input::File(path.into());
        self
    }

    pub fn stdout_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Output::File(path.into());
        self
    }

    /// Marks the statement as containing credentials.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Looks up a variable from the environment overlay.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Program and arguments for log output. The overlay is left out.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.as_str()];
        let mut hide_next = false;
        for arg in &self.args {
            parts.push(if hide_next { "<redacted>" } else { arg.as_str() });
            hide_next = self.secret && arg == "-c";
        }
        parts.join(" ")
    }
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Success,
    /// Non-zero exit; `None` when terminated by a signal
    Failed(Option<i32>),
    Cancelled,
}

impl ExitKind {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitKind::Success)
    }
}

impl From<ExitStatus> for ExitKind {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            ExitKind::Success
        } else {
            ExitKind::Failed(status.code())
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitKind::Success => write!(f, "exit status 0"),
            ExitKind::Failed(Some(code)) => write!(f, "exit status {code}"),
            ExitKind::Failed(None) => write!(f, "terminated by signal"),
            ExitKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Raw, unclassified result of a captured invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub exit: ExitKind,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    /// A zero exit with the given standard output.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit: ExitKind::Success,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A non-zero exit with the given standard error.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit: ExitKind::Failed(Some(code)),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            exit: ExitKind::Cancelled,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit.is_success()
    }
}

/// Executes invocation specs.
///
/// Implementations return `Err` only when the process could not be started
/// (missing executable, unreadable input file); a started process that exits
/// non-zero is a normal [`InvocationResult`].
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    /// Runs a process with captured output.
    async fn run(&self, spec: &InvocationSpec) -> Result<InvocationResult>;

    /// Runs a process attached to the caller's terminal.
    async fn run_interactive(&self, spec: &InvocationSpec) -> Result<ExitKind>;

    /// Streams the producer's standard output into the consumer's standard
    /// input. The result carries the consumer's output, both processes'
    /// standard error, and the first failing exit.
    async fn pipe(
        &self,
        producer: &InvocationSpec,
        consumer: &InvocationSpec,
    ) -> Result<InvocationResult>;
}

/// Runs real processes through tokio.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    cancel: Option<Arc<Notify>>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills captured invocations when `signal` is notified.
    ///
    /// Interactive invocations ignore the signal; the child owns the
    /// terminal and handles interrupts itself.
    pub fn with_cancellation(mut self, signal: Arc<Notify>) -> Self {
        self.cancel = Some(signal);
        self
    }

    fn captured_command(spec: &InvocationSpec) -> Result<Command> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &spec.stdin {
            Input::Null => {
                cmd.stdin(Stdio::null());
            }
            Input::File(path) => {
                let file = File::open(path).map_err(|e| OpsError::file_system(path, e))?;
                cmd.stdin(Stdio::from(file));
            }
        }
        match &spec.stdout {
            Output::Capture => {
                cmd.stdout(Stdio::piped());
            }
            Output::File(path) => {
                let file = File::create(path).map_err(|e| OpsError::file_system(path, e))?;
                cmd.stdout(Stdio::from(file));
            }
        }
        Ok(cmd)
    }

    fn spawn(cmd: &mut Command, spec: &InvocationSpec) -> Result<Child> {
        debug!("spawning: {}", spec.command_line());
        cmd.spawn().map_err(|e| spawn_error(spec, e))
    }

    /// Waits for `fut` unless the cancellation signal fires first.
    async fn until_cancelled<F, T>(&self, fut: F) -> Option<T>
    where
        F: std::future::Future<Output = T>,
    {
        match &self.cancel {
            Some(signal) => tokio::select! {
                value = fut => Some(value),
                () = signal.notified() => None,
            },
            None => Some(fut.await),
        }
    }
}

fn spawn_error(spec: &InvocationSpec, source: io::Error) -> OpsError {
    if source.kind() == io::ErrorKind::NotFound {
        OpsError::ToolNotFound {
            tool: spec.program.clone(),
            hint: spec.tool.install_hint().to_string(),
        }
    } else {
        OpsError::Spawn {
            tool: spec.program.clone(),
            source,
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn collect(child: &mut Child) -> io::Result<InvocationResult> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (status, stdout, stderr) = tokio::join!(child.wait(), read_all(stdout), read_all(stderr));
    Ok(InvocationResult {
        exit: status?.into(),
        stdout: stdout?,
        stderr: stderr?,
    })
}

impl ToolRunner for SystemRunner {
    async fn run(&self, spec: &InvocationSpec) -> Result<InvocationResult> {
        let mut child = Self::spawn(&mut Self::captured_command(spec)?, spec)?;

        let finished = self.until_cancelled(collect(&mut child)).await;
        match finished {
            Some(result) => result.map_err(|e| OpsError::Spawn {
                tool: spec.program.clone(),
                source: e,
            }),
            None => {
                debug!("cancelling: {}", spec.program);
                let _ = child.kill().await;
                Ok(InvocationResult::cancelled())
            }
        }
    }

    async fn run_interactive(&self, spec: &InvocationSpec) -> Result<ExitKind> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = Self::spawn(&mut cmd, spec)?;
        let status = child.wait().await.map_err(|e| OpsError::Spawn {
            tool: spec.program.clone(),
            source: e,
        })?;
        Ok(status.into())
    }

    async fn pipe(
        &self,
        producer: &InvocationSpec,
        consumer: &InvocationSpec,
    ) -> Result<InvocationResult> {
        let mut producer_cmd = Self::captured_command(producer)?;
        producer_cmd.stdout(Stdio::piped());
        let mut producer_child = Self::spawn(&mut producer_cmd, producer)?;

        let handoff: Stdio = producer_child
            .stdout
            .take()
            .map(|out| -> io::Result<Stdio> { out.try_into() })
            .transpose()
            .map_err(|e| OpsError::Spawn {
                tool: producer.program.clone(),
                source: e,
            })?
            .unwrap_or_else(Stdio::null);

        let mut consumer_cmd = Self::captured_command(consumer)?;
        consumer_cmd.stdin(handoff);
        let mut consumer_child = Self::spawn(&mut consumer_cmd, consumer)?;

        let both = async {
            tokio::join!(collect(&mut producer_child), collect(&mut consumer_child))
        };

        let finished = self.until_cancelled(both).await;
        let (upstream, downstream) = match finished {
            Some(pair) => pair,
            None => {
                debug!("cancelling: {} | {}", producer.program, consumer.program);
                let _ = producer_child.kill().await;
                let _ = consumer_child.kill().await;
                return Ok(InvocationResult::cancelled());
            }
        };
        let upstream = upstream.map_err(|e| OpsError::Spawn {
            tool: producer.program.clone(),
            source: e,
        })?;
        let downstream = downstream.map_err(|e| OpsError::Spawn {
            tool: consumer.program.clone(),
            source: e,
        })?;

        Ok(merge_pipeline(upstream, downstream))
    }
}

/// Combines the two halves of a pipeline into one result.
pub(crate) fn merge_pipeline(
    upstream: InvocationResult,
    downstream: InvocationResult,
) -> InvocationResult {
    let exit = if upstream.is_success() {
        downstream.exit
    } else {
        upstream.exit
    };
    let stderr = [upstream.stderr.trim(), downstream.stderr.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    InvocationResult {
        exit,
        stdout: downstream.stdout,
        stderr,
    }
}
