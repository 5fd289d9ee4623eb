//! External ACME client supervision.
//!
//! The client runs as a child process in DNS-01 manual mode. Its hooks call
//! back into `dnsflow hook auth|cleanup`, so this module only owns the
//! process: arguments, pipes, the wall-clock budget and termination.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::CertificateSettings;
use crate::error::{CoreError, CoreResult};

/// One issuance or renewal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcmeRequest {
    /// Lineage name, also the directory under `live/`
    pub cert_name: String,
    pub domains: Vec<String>,
    pub email: Option<String>,
    /// Persistent client state (ACME account, issued lineages)
    pub config_dir: PathBuf,
    pub auth_hook: String,
    pub cleanup_hook: String,
    pub force_renewal: bool,
}

/// Runs an ACME client to completion.
#[async_trait]
pub trait AcmeRunner: Send + Sync {
    /// Returns the client's stdout on success.
    ///
    /// Cancelling `cancel` stops the wait and terminates the client.
    async fn run(&self, request: &AcmeRequest, cancel: CancellationToken) -> CoreResult<String>;
}

/// Drives `certbot certonly --manual --preferred-challenges dns`.
pub struct CertbotRunner {
    program: OsString,
    /// Arguments placed before the certbot ones (`sudo certbot`, `python -m certbot`)
    leading_args: Vec<OsString>,
    timeout: Duration,
    grace: Duration,
    kill_wait: Duration,
}

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

impl CertbotRunner {
    pub fn new(settings: &CertificateSettings) -> Self {
        let mut parts = settings.acme_client.split_whitespace().map(OsString::from);
        Self {
            program: parts.next().unwrap_or_else(|| OsString::from("certbot")),
            leading_args: parts.collect(),
            timeout: settings.process_timeout(),
            grace: Duration::from_secs(settings.terminate_grace_secs),
            kill_wait: Duration::from_secs(settings.kill_wait_secs),
        }
    }

    #[must_use]
    pub fn with_command<I, S>(mut self, program: impl Into<OsString>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.program = program.into();
        self.leading_args = leading_args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeout: Duration, grace: Duration, kill_wait: Duration) -> Self {
        self.timeout = timeout;
        self.grace = grace;
        self.kill_wait = kill_wait;
        self
    }

    /// Command line for one attempt; `scratch` holds work and log dirs.
    pub fn build_args(request: &AcmeRequest, scratch: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "certonly",
            "--manual",
            "--preferred-challenges",
            "dns",
            "--non-interactive",
            "--agree-tos",
            "--manual-auth-hook",
        ]
        .map(OsString::from)
        .to_vec();
        args.push(request.auth_hook.clone().into());
        args.push("--manual-cleanup-hook".into());
        args.push(request.cleanup_hook.clone().into());

        match &request.email {
            Some(email) => {
                args.push("--email".into());
                args.push(email.into());
            }
            None => args.push("--register-unsafely-without-email".into()),
        }

        args.push("--config-dir".into());
        args.push(request.config_dir.clone().into_os_string());
        args.push("--work-dir".into());
        args.push(scratch.join("work").into_os_string());
        args.push("--logs-dir".into());
        args.push(scratch.join("logs").into_os_string());
        args.push("--cert-name".into());
        args.push(request.cert_name.clone().into());
        if request.force_renewal {
            args.push("--force-renewal".into());
        }
        for domain in &request.domains {
            args.push("-d".into());
            args.push(domain.into());
        }
        args
    }

    /// SIGTERM, then SIGKILL once the grace period runs out.
    async fn terminate(&self, child: &mut Child) {
        if let Some(pid) = child.id() {
            send_sigterm(pid).await;
            if tokio::time::timeout(self.grace, child.wait()).await.is_ok() {
                log::info!("ACME client {pid} terminated");
                return;
            }
            log::warn!("ACME client {pid} ignored SIGTERM, killing");
        }
        if let Err(e) = child.start_kill() {
            log::error!("Failed to kill ACME client: {e}");
        }
        match tokio::time::timeout(self.kill_wait, child.wait()).await {
            Ok(_) => log::info!("ACME client killed"),
            Err(_) => log::error!("ACME client did not exit after SIGKILL"),
        }
    }
}

#[cfg(unix)]
async fn send_sigterm(pid: u32) {
    let sent = Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = sent {
        log::warn!("Failed to send SIGTERM to {pid}: {e}");
    }
}

#[cfg(not(unix))]
async fn send_sigterm(_pid: u32) {}

fn drain<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                log::debug!("ACME client pipe closed early: {e}");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Whether the client's output says it needs root/administrator rights.
pub fn needs_elevated_privileges(output: &str) -> bool {
    let output = output.to_ascii_lowercase();
    ["administrative rights", "as root", "permission denied"]
        .iter()
        .any(|needle| output.contains(needle))
}

#[async_trait]
impl AcmeRunner for CertbotRunner {
    async fn run(&self, request: &AcmeRequest, cancel: CancellationToken) -> CoreResult<String> {
        let scratch = tempfile::Builder::new()
            .prefix("dnsflow-acme-")
            .tempdir()
            .map_err(|e| CoreError::StorageError(format!("failed to create ACME work dir: {e}")))?;
        std::fs::create_dir_all(&request.config_dir).map_err(|e| {
            CoreError::StorageError(format!(
                "failed to create {}: {e}",
                request.config_dir.display()
            ))
        })?;

        let args = Self::build_args(request, scratch.path());
        log::info!(
            "Starting ACME client for {} ({})",
            request.cert_name,
            request.domains.join(", ")
        );
        log::debug!("ACME command: {:?} {args:?}", self.program);

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::AcmeFailed {
                exit_code: None,
                message: format!("failed to start {:?}: {e}", self.program),
            })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let outcome = tokio::select! {
            status = child.wait() => WaitOutcome::Exited(status),
            () = tokio::time::sleep(self.timeout) => WaitOutcome::TimedOut,
            () = cancel.cancelled() => WaitOutcome::Cancelled,
        };

        let status = match outcome {
            WaitOutcome::Exited(status) => status,
            WaitOutcome::TimedOut => {
                log::error!(
                    "ACME client for {} timed out after {:?}",
                    request.cert_name,
                    self.timeout
                );
                self.terminate(&mut child).await;
                stdout.abort();
                stderr.abort();
                return Err(CoreError::AcmeTimeout {
                    secs: self.timeout.as_secs(),
                });
            }
            WaitOutcome::Cancelled => {
                log::warn!("ACME client for {} cancelled", request.cert_name);
                self.terminate(&mut child).await;
                stdout.abort();
                stderr.abort();
                return Err(CoreError::AcmeCancelled);
            }
        };

        let stdout = stdout.await.unwrap_or_default();
        let stderr = stderr.await.unwrap_or_default();
        log::debug!("ACME client stdout: {}", stdout.trim());
        if !stderr.trim().is_empty() {
            log::debug!("ACME client stderr: {}", stderr.trim());
        }

        let status = status.map_err(|e| CoreError::AcmeFailed {
            exit_code: None,
            message: format!("failed to wait for ACME client: {e}"),
        })?;
        if status.success() {
            return Ok(stdout);
        }

        let message = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("unknown error")
            .to_string();
        if needs_elevated_privileges(&message) {
            return Err(CoreError::ElevatedPrivileges(message));
        }
        Err(CoreError::AcmeFailed {
            exit_code: status.code(),
            message,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn request(config_dir: &Path) -> AcmeRequest {
        AcmeRequest {
            cert_name: "example.com".to_string(),
            domains: vec!["example.com".to_string(), "*.example.com".to_string()],
            email: None,
            config_dir: config_dir.to_path_buf(),
            auth_hook: "dnsflow hook auth".to_string(),
            cleanup_hook: "dnsflow hook cleanup".to_string(),
            force_renewal: true,
        }
    }

    /// Shell script standing in for certbot, run through `sh`.
    fn fake_client(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-certbot.sh");
        std::fs::write(&path, format!("{body}\n")).unwrap();
        path
    }

    fn runner(script: &Path, timeout_ms: u64) -> CertbotRunner {
        CertbotRunner::new(&CertificateSettings::default())
            .with_command("sh", [script])
            .with_timeouts(
                Duration::from_millis(timeout_ms),
                Duration::from_millis(300),
                Duration::from_secs(2),
            )
    }

    #[test]
    fn command_line_shape() {
        let args = CertbotRunner::build_args(&request(Path::new("/var/lib/acme")), Path::new("/tmp/x"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args[0], "certonly");
        assert!(args.contains(&"--manual".to_string()));
        assert!(args.contains(&"--register-unsafely-without-email".to_string()));
        assert!(args.contains(&"--force-renewal".to_string()));
        let hook = args.iter().position(|a| a == "--manual-auth-hook").unwrap();
        assert_eq!(args[hook + 1], "dnsflow hook auth");
        let work = args.iter().position(|a| a == "--work-dir").unwrap();
        assert_eq!(args[work + 1], "/tmp/x/work");
        assert_eq!(args.iter().filter(|a| *a == "-d").count(), 2);
    }

    #[test]
    fn acme_client_setting_may_carry_a_prefix() {
        let settings = CertificateSettings {
            acme_client: "sudo -n certbot".to_string(),
            ..CertificateSettings::default()
        };
        let runner = CertbotRunner::new(&settings);
        assert_eq!(runner.program, "sudo");
        assert_eq!(runner.leading_args, vec![OsString::from("-n"), OsString::from("certbot")]);
    }

    #[test]
    fn email_replaces_unsafe_registration() {
        let mut req = request(Path::new("/var/lib/acme"));
        req.email = Some("ops@example.com".to_string());
        req.force_renewal = false;
        let args = CertbotRunner::build_args(&req, Path::new("/tmp/x"));

        assert!(args.contains(&OsString::from("ops@example.com")));
        assert!(!args.contains(&OsString::from("--register-unsafely-without-email")));
        assert!(!args.contains(&OsString::from("--force-renewal")));
    }

    #[test]
    fn privilege_errors_are_recognized() {
        assert!(needs_elevated_privileges(
            "The requested action requires Administrative rights."
        ));
        assert!(needs_elevated_privileges("certbot must be run as root"));
        assert!(needs_elevated_privileges("open /etc/letsencrypt: Permission denied"));
        assert!(!needs_elevated_privileges("DNS problem: NXDOMAIN"));
    }

    #[tokio::test]
    async fn success_returns_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_client(dir.path(), "echo \"issued $1\"");
        let out = runner(&program, 5_000)
            .run(&request(&dir.path().join("cfg")), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.trim(), "issued certonly");
        assert!(dir.path().join("cfg").is_dir());
    }

    #[tokio::test]
    async fn non_zero_exit_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_client(dir.path(), "echo 'DNS problem: NXDOMAIN' >&2\nexit 1");
        let err = runner(&program, 5_000)
            .run(&request(&dir.path().join("cfg")), CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            CoreError::AcmeFailed { exit_code, message } => {
                assert_eq!(exit_code, Some(1));
                assert!(message.contains("NXDOMAIN"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn privilege_failure_is_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_client(
            dir.path(),
            "echo 'The requested action requires administrative rights.' >&2\nexit 1",
        );
        let err = runner(&program, 5_000)
            .run(&request(&dir.path().join("cfg")), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ElevatedPrivileges(_)));
    }

    #[tokio::test]
    async fn timeout_terminates_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_client(dir.path(), "exec sleep 30");
        let started = Instant::now();

        let err = runner(&program, 200)
            .run(&request(&dir.path().join("cfg")), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AcmeTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn sigterm_ignored_escalates_to_kill() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_client(dir.path(), "trap '' TERM\nexec sleep 30");
        let started = Instant::now();

        let err = runner(&program, 200)
            .run(&request(&dir.path().join("cfg")), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AcmeTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn cancellation_terminates_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_client(dir.path(), "exec sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let err = runner(&program, 60_000)
            .run(&request(&dir.path().join("cfg")), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AcmeCancelled));
    }
}
