use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::DispatchError;

use super::{Intent, IntentDispatcher};

pub const DEFAULT_ADB_TIMEOUT_SECS: u64 = 15;

/// Starts activities on a connected device through `adb shell am start`.
pub struct AdbDispatcher {
    adb: PathBuf,
    serial: Option<String>,
    timeout: u64,
}

impl AdbDispatcher {
    /// Use `adb_path` when given, otherwise look `adb` up on `PATH`.
    pub fn new(adb_path: Option<&str>, serial: Option<String>) -> Result<Self, DispatchError> {
        let adb = match adb_path {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => which::which("adb")
                .map_err(|e| DispatchError::Unavailable(format!("adb not found on PATH: {e}")))?,
        };

        Ok(Self {
            adb,
            serial,
            timeout: DEFAULT_ADB_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs.max(1);
        self
    }

    /// Arguments passed to adb. Everything after `shell` is re-parsed by the
    /// device shell, so each value is single-quoted.
    pub fn build_args(&self, intent: &Intent) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref serial) = self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.extend(["shell", "am", "start", "-a"].map(String::from));
        args.push(shell_quote(&intent.action));
        for (key, value) in &intent.extras {
            args.push("--es".to_string());
            args.push(shell_quote(key));
            args.push(shell_quote(value));
        }
        args
    }
}

#[async_trait]
impl IntentDispatcher for AdbDispatcher {
    async fn start_activity(&self, intent: &Intent) -> Result<(), DispatchError> {
        let args = self.build_args(intent);
        debug!("{} {}", self.adb.display(), args.join(" "));

        // Kill adb if it outlives the timeout.
        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout),
            Command::new(&self.adb).args(&args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| DispatchError::Rejected(format!("adb timed out after {} seconds", self.timeout)))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let message = first_error_line(&stderr)
                .or_else(|| first_error_line(&stdout))
                .unwrap_or_else(|| format!("adb exited with code {}", output.status.code().unwrap_or(-1)));
            warn!("adb rejected {}: {}", intent, message);
            return Err(DispatchError::Rejected(message));
        }

        // `am start` reports resolution failures on stdout with exit code 0.
        if let Some(message) = first_error_line(&stdout).or_else(|| first_error_line(&stderr)) {
            warn!("activity manager rejected {}: {}", intent, message);
            return Err(DispatchError::Rejected(message));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "adb"
    }
}

fn first_error_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("Error") || l.starts_with("error:") || l.starts_with("adb: error"))
        .map(|l| l.to_string())
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(serial: Option<&str>) -> AdbDispatcher {
        AdbDispatcher::new(Some("/usr/bin/adb"), serial.map(String::from)).unwrap()
    }

    #[test]
    fn test_build_args_with_extras() {
        let mut intent = Intent::new("android.intent.action.DIAL");
        intent.put_extra("tel", "5551234");

        let args = dispatcher(None).build_args(&intent);
        assert_eq!(
            args,
            vec![
                "shell",
                "am",
                "start",
                "-a",
                "'android.intent.action.DIAL'",
                "--es",
                "'tel'",
                "'5551234'",
            ]
        );
    }

    #[test]
    fn test_build_args_with_serial() {
        let args = dispatcher(Some("emulator-5554")).build_args(&Intent::new("android.intent.action.MAIN"));
        assert_eq!(&args[..2], &["-s", "emulator-5554"]);
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("a b"), "'a b'");
    }

    #[test]
    fn test_first_error_line() {
        let out = "Starting: Intent { act=foo }\nError: Activity not started, unable to resolve Intent";
        assert_eq!(
            first_error_line(out).as_deref(),
            Some("Error: Activity not started, unable to resolve Intent")
        );
        assert_eq!(first_error_line("Starting: Intent { act=foo }"), None);
        assert_eq!(
            first_error_line("adb: error: no devices/emulators found").as_deref(),
            Some("adb: error: no devices/emulators found")
        );
    }

    /// Writes an executable stand-in for adb that runs `body`.
    #[cfg(unix)]
    fn fake_adb(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("adb");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn fake_dispatcher(adb: &std::path::Path) -> AdbDispatcher {
        AdbDispatcher::new(adb.to_str(), None).unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_activity_manager_error_on_stdout_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let adb = fake_adb(
            tmp.path(),
            "echo 'Starting: Intent { act=com.example.NOPE }'\n\
             echo 'Error: Activity not started, unable to resolve Intent'\n\
             exit 0",
        );

        let err = fake_dispatcher(&adb)
            .start_activity(&Intent::new("com.example.NOPE"))
            .await
            .unwrap_err();
        match err {
            DispatchError::Rejected(msg) => {
                assert_eq!(msg, "Error: Activity not started, unable to resolve Intent")
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_rejected_with_stderr_line() {
        let tmp = tempfile::tempdir().unwrap();
        let adb = fake_adb(tmp.path(), "echo 'adb: error: no devices/emulators found' >&2\nexit 1");

        let err = fake_dispatcher(&adb)
            .start_activity(&Intent::new("android.intent.action.DIAL"))
            .await
            .unwrap_err();
        match err {
            DispatchError::Rejected(msg) => assert_eq!(msg, "adb: error: no devices/emulators found"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_without_message_reports_code() {
        let tmp = tempfile::tempdir().unwrap();
        let adb = fake_adb(tmp.path(), "exit 3");

        let err = fake_dispatcher(&adb)
            .start_activity(&Intent::new("android.intent.action.DIAL"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "adb exited with code 3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clean_start_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let adb = fake_adb(tmp.path(), "echo 'Starting: Intent { act=android.intent.action.DIAL }'");

        fake_dispatcher(&adb)
            .start_activity(&Intent::new("android.intent.action.DIAL"))
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_adb_is_killed() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("launched");
        let adb = fake_adb(tmp.path(), &format!("sleep 2\ntouch '{}'", marker.display()));

        let err = fake_dispatcher(&adb)
            .with_timeout(1)
            .start_activity(&Intent::new("android.intent.action.DIAL"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "adb timed out after 1 seconds");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "adb kept running after the timeout");
    }

    #[test]
    fn test_timeout_is_at_least_one_second() {
        assert_eq!(dispatcher(None).with_timeout(0).timeout, 1);
        assert_eq!(dispatcher(None).timeout, DEFAULT_ADB_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let adb = AdbDispatcher::new(Some("/nonexistent/intentbot-adb"), None).unwrap();
        let err = adb
            .start_activity(&Intent::new("android.intent.action.MAIN"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Io(_)));
    }
}
