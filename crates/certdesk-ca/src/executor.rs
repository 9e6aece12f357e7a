//! External issuance/revocation actions.
//!
//! The scripts are opaque collaborators: they receive string parameters and
//! answer with an exit status plus text. Every parameter is escaped into a
//! single POSIX shell word before it reaches the command line.

use async_trait::async_trait;
use certdesk_core::{AuditAction, AuditEntry, CertdeskError, Result};
use std::borrow::Cow;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use crate::audit::AuditLog;
use crate::config::ActionsConfig;

/// Which external action to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Issue a certificate: `(domain, additionalParam)`
    Issue,
    /// Revoke a certificate: `(id)`
    Revoke,
}

impl ActionKind {
    /// Names of the parameters the action takes, in order
    #[must_use]
    pub const fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::Issue => &["domain", "additionalParam"],
            Self::Revoke => &["id"],
        }
    }

    /// Audit action recorded on success
    #[must_use]
    pub const fn audit_action(self) -> AuditAction {
        match self {
            Self::Issue => AuditAction::Create,
            Self::Revoke => AuditAction::Revoke,
        }
    }

    /// Short name used in errors and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Revoke => "revoke",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    /// Exit status, `None` if the process was killed by a signal
    pub status: Option<i32>,
    /// stdout and stderr, in that order
    pub output: String,
}

impl ActionOutput {
    /// Returns true if the action exited with status 0
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

/// Runs an external action.
///
/// Implementations report a process that ran to completion as `Ok`, whatever
/// its exit status. `Err` is reserved for actions that could not be run or
/// did not finish.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    /// Run `kind` with already validated parameters
    async fn run(&self, kind: ActionKind, params: &[String]) -> Result<ActionOutput>;
}

/// Runs the configured scripts through a POSIX shell
#[derive(Debug, Clone)]
pub struct ShellRunner {
    config: ActionsConfig,
}

impl ShellRunner {
    /// Runner for the scripts in `config`
    #[must_use]
    pub const fn new(config: ActionsConfig) -> Self {
        Self { config }
    }

    /// Shell command line for `kind`. Every word is quoted.
    #[must_use]
    pub fn command_line(&self, kind: ActionKind, params: &[String]) -> String {
        let script = match kind {
            ActionKind::Issue => &self.config.issue_script,
            ActionKind::Revoke => &self.config.revoke_script,
        };

        let mut line = quote_arg(&script.to_string_lossy());
        for param in params {
            line.push(' ');
            line.push_str(&quote_arg(param));
        }
        line.push_str(" 2>&1");
        line
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }
}

#[async_trait]
impl ActionRunner for ShellRunner {
    async fn run(&self, kind: ActionKind, params: &[String]) -> Result<ActionOutput> {
        let command_line = self.command_line(kind, params);
        debug!(action = %kind, command = %command_line, "running external action");

        let action_error = |output: String| CertdeskError::ExternalAction {
            action: kind.to_string(),
            status: None,
            output,
        };

        let mut command = Command::new(&self.config.shell);
        command
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // The script and everything it starts share one group, killed as a unit.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            action_error(format!("failed to start {}: {e}", self.config.shell.display()))
        })?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let timeout = self.timeout();
        let finished = tokio::time::timeout(timeout, async {
            tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok((Ok(status), Ok(stdout), Ok(stderr))) => (status, stdout, stderr),
            Ok((Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e))) => {
                terminate(&mut child, kind).await;
                return Err(action_error(e.to_string()));
            }
            Err(_) => {
                warn!(action = %kind, timeout_secs = timeout.as_secs(), "external action timed out");
                terminate(&mut child, kind).await;
                return Err(action_error(format!("timed out after {}s", timeout.as_secs())));
            }
        };

        let mut text = String::from_utf8_lossy(&stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&stderr));

        Ok(ActionOutput {
            status: status.code(),
            output: text,
        })
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill the action's whole process group, then reap the shell
async fn terminate(child: &mut Child, kind: ActionKind) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            #[allow(clippy::cast_possible_wrap)]
            let group = Pid::from_raw(pid as i32);
            if let Err(e) = killpg(group, Signal::SIGKILL) {
                warn!(action = %kind, pid, error = %e, "failed to kill action process group");
            }
        }
    }

    if let Err(e) = child.start_kill() {
        debug!(action = %kind, error = %e, "action shell already gone");
    }
    if let Err(e) = child.wait().await {
        warn!(action = %kind, error = %e, "failed to reap action shell");
    }
}

/// Quote `value` as exactly one POSIX shell word
#[must_use]
pub fn quote_arg(value: &str) -> String {
    shell_escape::unix::escape(Cow::Borrowed(value)).into_owned()
}

/// Validates parameters, runs the action and records successful ones
#[derive(Clone)]
pub struct ActionExecutor {
    runner: Arc<dyn ActionRunner>,
    audit: AuditLog,
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl ActionExecutor {
    /// Executor running actions through `runner` and auditing to `audit`
    pub fn new(runner: Arc<dyn ActionRunner>, audit: AuditLog) -> Self {
        Self { runner, audit }
    }

    /// Executor for the configured shell scripts
    pub fn shell(config: ActionsConfig, audit: AuditLog) -> Self {
        Self::new(Arc::new(ShellRunner::new(config)), audit)
    }

    /// The audit log successful actions are written to
    #[must_use]
    pub const fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Run `kind` on behalf of `actor`.
    ///
    /// Exactly one audit entry is written when the action exits 0; its target
    /// is the first parameter as given, before quoting. A failure to write
    /// that entry is logged and does not undo the action.
    ///
    /// # Errors
    ///
    /// - `CertdeskError::Validation` if a parameter is missing or blank; no
    ///   process is started
    /// - `CertdeskError::ExternalAction` if the action exits non-zero, cannot
    ///   be started or times out; nothing is audited
    pub async fn execute(
        &self,
        kind: ActionKind,
        params: &[String],
        actor: &str,
    ) -> Result<ActionOutput> {
        validate(kind, params)?;

        let output = self.runner.run(kind, params).await?;
        if !output.success() {
            warn!(action = %kind, status = ?output.status, "external action failed");
            return Err(CertdeskError::ExternalAction {
                action: kind.to_string(),
                status: output.status,
                output: output.output,
            });
        }

        let target = &params[0];
        info!(action = %kind, target = %target, actor = %actor, "external action succeeded");

        let entry = AuditEntry::new(kind.audit_action(), target.as_str(), actor);
        if let Err(e) = self.audit.append(&entry).await {
            error!(action = %kind, target = %target, error = %e, "failed to record audit entry");
        }

        Ok(output)
    }
}

fn validate(kind: ActionKind, params: &[String]) -> Result<()> {
    let names = kind.parameters();
    if params.len() != names.len() {
        return Err(CertdeskError::validation(format!(
            "{kind} takes {} parameter(s), got {}",
            names.len(),
            params.len()
        )));
    }

    for (name, value) in names.iter().zip(params) {
        if value.trim().is_empty() {
            return Err(CertdeskError::validation(format!("{name} is required")));
        }
        if value.contains('\0') {
            return Err(CertdeskError::validation(format!("{name} contains a NUL byte")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeRunner {
        status: Option<i32>,
        output: String,
        calls: Mutex<Vec<(ActionKind, Vec<String>)>>,
    }

    impl FakeRunner {
        fn new(status: Option<i32>, output: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                output: output.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ActionRunner for FakeRunner {
        async fn run(&self, kind: ActionKind, params: &[String]) -> Result<ActionOutput> {
            self.calls.lock().unwrap().push((kind, params.to_vec()));
            Ok(ActionOutput {
                status: self.status,
                output: self.output.clone(),
            })
        }
    }

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn executor(runner: Arc<FakeRunner>, dir: &tempfile::TempDir) -> ActionExecutor {
        ActionExecutor::new(runner, AuditLog::new(dir.path().join("actions.log")))
    }

    #[tokio::test]
    async fn success_writes_one_audit_entry() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(Some(0), "issued\n");
        let exec = executor(runner.clone(), &dir);

        let out = exec
            .execute(ActionKind::Issue, &params(&["bar.example.com", "aux"]), "alice")
            .await
            .unwrap();
        assert_eq!(out.output, "issued\n");

        let history = exec.audit_log().read_all().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, AuditAction::Create);
        assert_eq!(history[0].username, "alice");
        assert_eq!(history[0].certificate_name, "bar.example.com");
        assert_eq!(runner.calls(), 1);
    }

    #[tokio::test]
    async fn non_zero_exit_is_not_audited() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(Some(1), "openssl: unknown certificate\n");
        let exec = executor(runner, &dir);

        let err = exec
            .execute(ActionKind::Revoke, &params(&["foo.example.com"]), "alice")
            .await
            .unwrap_err();
        match err {
            CertdeskError::ExternalAction {
                action,
                status,
                output,
            } => {
                assert_eq!(action, "revoke");
                assert_eq!(status, Some(1));
                assert_eq!(output, "openssl: unknown certificate\n");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(exec.audit_log().read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_parameters_never_start_a_process() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(Some(0), "");
        let exec = executor(runner.clone(), &dir);

        for bad in [
            params(&["bar.example.com", "   "]),
            params(&["", "aux"]),
            params(&["bar.example.com"]),
            params(&["bar\0.example.com", "aux"]),
        ] {
            let err = exec.execute(ActionKind::Issue, &bad, "alice").await.unwrap_err();
            assert!(matches!(err, CertdeskError::Validation(_)), "{bad:?}");
        }
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn audit_failure_does_not_fail_the_action() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let runner = FakeRunner::new(Some(0), "");
        let exec = ActionExecutor::new(runner, AuditLog::new(blocker.join("actions.log")));

        assert!(exec
            .execute(ActionKind::Revoke, &params(&["foo.example.com"]), "alice")
            .await
            .is_ok());
    }

    #[test]
    fn quoting_produces_single_words() {
        assert_eq!(quote_arg("foo.example.com"), "foo.example.com");
        assert_eq!(quote_arg("a b"), "'a b'");
        assert!(quote_arg("; rm -rf /").starts_with('\''));
    }

    #[test]
    fn command_line_redirects_stderr() {
        let runner = ShellRunner::new(ActionsConfig::default());
        let line = runner.command_line(ActionKind::Revoke, &params(&["x y"]));
        assert_eq!(line, "/root/scripts/revoke_cert.sh 'x y' 2>&1");
    }

    #[cfg(unix)]
    mod shell {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn runner(dir: &Path, body: &str, timeout_secs: u64) -> ShellRunner {
            let path = script(dir, "action.sh", body);
            ShellRunner::new(ActionsConfig {
                issue_script: path.clone(),
                revoke_script: path,
                timeout_secs,
                ..ActionsConfig::default()
            })
        }

        const ECHO_ARGS: &str = "echo \"argc=$#\"\nfor a in \"$@\"; do printf '[%s]\\n' \"$a\"; done\n";

        #[tokio::test]
        async fn hostile_input_is_one_literal_argument() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("pwned");
            let hostile = format!(
                "\"; touch {m}; echo \" '$(touch {m})' `touch {m}` \n touch {m}",
                m = marker.display()
            );
            let runner = runner(dir.path(), ECHO_ARGS, 10);

            let out = runner
                .run(ActionKind::Revoke, &[hostile.clone()])
                .await
                .unwrap();

            assert!(out.success());
            assert_eq!(out.output, format!("argc=1\n[{hostile}]\n"));
            assert!(!marker.exists());
        }

        #[tokio::test]
        async fn issue_receives_two_arguments() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(dir.path(), ECHO_ARGS, 10);

            let out = runner
                .run(ActionKind::Issue, &params(&["bar.example.com", "with space"]))
                .await
                .unwrap();
            assert_eq!(out.output, "argc=2\n[bar.example.com]\n[with space]\n");
        }

        #[tokio::test]
        async fn stderr_and_status_are_captured() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(dir.path(), "echo out\necho err >&2\nexit 3\n", 10);

            let out = runner.run(ActionKind::Revoke, &params(&["x"])).await.unwrap();
            assert_eq!(out.status, Some(3));
            assert!(out.output.contains("out"));
            assert!(out.output.contains("err"));
        }

        #[tokio::test]
        async fn slow_action_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(dir.path(), "sleep 5\n", 1);

            let err = runner.run(ActionKind::Revoke, &params(&["x"])).await.unwrap_err();
            assert!(matches!(
                err,
                CertdeskError::ExternalAction { status: None, .. }
            ));
        }

        #[tokio::test]
        async fn timed_out_action_leaves_no_side_effects() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("issued");
            let body = format!("sleep 2\ntouch {}\n", quote_arg(&marker.to_string_lossy()));
            let exec = ActionExecutor::new(
                Arc::new(runner(dir.path(), &body, 1)),
                AuditLog::new(dir.path().join("actions.log")),
            );

            let err = exec
                .execute(ActionKind::Revoke, &params(&["foo.example.com"]), "alice")
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                CertdeskError::ExternalAction { status: None, .. }
            ));

            tokio::time::sleep(Duration::from_secs(3)).await;
            assert!(!marker.exists());
            assert!(exec.audit_log().read_all().await.unwrap().is_empty());
        }
    }
}
