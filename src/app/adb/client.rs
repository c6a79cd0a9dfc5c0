use tracing::{debug, info, warn};

use crate::app::adb::locator::resolve_adb_program;
use crate::app::adb::parse::{parse_adb_devices, parse_getprop_value, DeviceSummary};
use crate::app::adb::runner::{CommandOutput, CommandRunner, ProcessRunner};
use crate::app::config::AdbSettings;
use crate::app::error::AppError;
use crate::app::models::{AdbInfo, Device, UNKNOWN_OS_VERSION};

pub const VIEW_ACTION: &str = "android.intent.action.VIEW";
pub const OS_VERSION_PROP: &str = "ro.build.version.release";

pub struct AdbClient {
    program: Option<String>,
    runner: Box<dyn CommandRunner>,
    settings: AdbSettings,
}

impl AdbClient {
    pub fn new(
        program: Option<String>,
        runner: Box<dyn CommandRunner>,
        settings: AdbSettings,
    ) -> Self {
        Self {
            program,
            runner,
            settings,
        }
    }

    /// Resolves adb from the settings and runs it as a real subprocess.
    pub fn from_settings(settings: &AdbSettings) -> Self {
        let program = resolve_adb_program(&settings.command_path);
        Self::new(program, Box::new(ProcessRunner), settings.clone())
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    fn require_program(&self, trace_id: &str) -> Result<&str, AppError> {
        self.program.as_deref().ok_or_else(|| {
            AppError::dependency(
                "adb executable not found; install platform-tools or set adb.command_path",
                trace_id,
            )
        })
    }

    pub fn check(&self, trace_id: &str) -> AdbInfo {
        let Some(program) = self.program.as_deref() else {
            return AdbInfo {
                available: false,
                version_output: String::new(),
                command_path: None,
                error: Some("adb executable not found".to_string()),
            };
        };
        let args = vec!["version".to_string()];
        let result = self
            .runner
            .run(program, &args, self.settings.property_timeout(), trace_id);
        match result {
            Ok(output) if output.success() => AdbInfo {
                available: true,
                version_output: output.stdout.trim().to_string(),
                command_path: Some(program.to_string()),
                error: None,
            },
            Ok(output) => AdbInfo {
                available: false,
                version_output: output.stdout.trim().to_string(),
                command_path: Some(program.to_string()),
                error: Some(format!(
                    "adb version exited with {:?}: {}",
                    output.exit_code,
                    output.stderr.trim()
                )),
            },
            Err(err) => AdbInfo {
                available: false,
                version_output: String::new(),
                command_path: Some(program.to_string()),
                error: Some(err.error),
            },
        }
    }

    /// Point-in-time snapshot of attached devices. Listing failures yield an empty list.
    pub fn list_devices(&self, trace_id: &str) -> Vec<Device> {
        let Some(program) = self.program.as_deref() else {
            warn!(trace_id = %trace_id, "adb not resolved; no devices");
            return Vec::new();
        };
        let args = vec!["devices".to_string(), "-l".to_string()];
        let output = match self
            .runner
            .run(program, &args, self.settings.devices_timeout(), trace_id)
        {
            Ok(output) => output,
            Err(err) => {
                warn!(trace_id = %trace_id, error = %err.error, "adb devices failed");
                return Vec::new();
            }
        };
        if !output.success() {
            warn!(
                trace_id = %trace_id,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "adb devices exited with failure"
            );
            return Vec::new();
        }

        let devices: Vec<Device> = parse_adb_devices(&output.stdout)
            .into_iter()
            .filter(DeviceSummary::is_ready)
            .map(|summary| Device {
                os_version: self.os_version(program, &summary.serial, trace_id),
                model: summary.display_model(),
                serial: summary.serial,
            })
            .collect();
        info!(trace_id = %trace_id, count = devices.len(), "devices listed");
        devices
    }

    fn os_version(&self, program: &str, serial: &str, trace_id: &str) -> String {
        let args = vec![
            "-s".to_string(),
            serial.to_string(),
            "shell".to_string(),
            "getprop".to_string(),
            OS_VERSION_PROP.to_string(),
        ];
        match self
            .runner
            .run(program, &args, self.settings.property_timeout(), trace_id)
        {
            Ok(output) if output.success() => parse_getprop_value(&output.stdout)
                .unwrap_or_else(|| UNKNOWN_OS_VERSION.to_string()),
            Ok(output) => {
                debug!(trace_id = %trace_id, serial = %serial, exit_code = ?output.exit_code, "getprop failed");
                UNKNOWN_OS_VERSION.to_string()
            }
            Err(err) => {
                debug!(trace_id = %trace_id, serial = %serial, error = %err.error, "getprop failed");
                UNKNOWN_OS_VERSION.to_string()
            }
        }
    }

    /// Fires a VIEW intent carrying `deeplink` verbatim. No serial defers to adb's own
    /// device selection.
    pub fn start_view_intent(
        &self,
        serial: Option<&str>,
        deeplink: &str,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        let program = self.require_program(trace_id)?;
        let args = build_view_intent_args(serial, deeplink);
        let output = self
            .runner
            .run(program, &args, self.settings.launch_timeout(), trace_id)?;
        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim()
            } else {
                output.stderr.trim()
            };
            return Err(AppError::dependency(
                format!(
                    "adb am start failed (exit {}): {detail}",
                    output
                        .exit_code
                        .map(|code| code.to_string())
                        .unwrap_or_else(|| "signal".to_string())
                ),
                trace_id,
            ));
        }
        Ok(output)
    }
}

pub fn build_view_intent_args(serial: Option<&str>, deeplink: &str) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(serial) = serial.filter(|value| !value.trim().is_empty()) {
        args.push("-s".to_string());
        args.push(serial.to_string());
    }
    args.extend(
        ["shell", "am", "start", "-a", VIEW_ACTION, "-d"]
            .iter()
            .map(|value| value.to_string()),
    );
    args.push(deeplink.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adb::runner::scripted::{exit, ok, ScriptedRunner};
    use std::time::Duration;

    const DEVICES: &str = "List of devices attached\n\
R58M123ABC device usb:1-1 product:beyond1 model:SM_G973F device:beyond1 transport_id:1\n\
emulator-5554 device product:sdk model:sdk_gphone64_arm64 device:emu64a transport_id:2\n\
0123456789ABCDEF unauthorized usb:1-2 transport_id:3\n";

    fn client(runner: ScriptedRunner) -> AdbClient {
        AdbClient::new(
            Some("adb".to_string()),
            Box::new(runner),
            AdbSettings::default(),
        )
    }

    fn is_getprop(args: &[String], serial: &str) -> bool {
        args.len() == 5 && args[1] == serial && args[3] == "getprop"
    }

    #[test]
    fn lists_ready_devices_with_versions() {
        let runner = ScriptedRunner::new(|args| {
            if args[0] == "devices" {
                ok(DEVICES)
            } else if is_getprop(args, "R58M123ABC") {
                ok("12\n")
            } else {
                Err(AppError::system("Command timed out after 2s", ""))
            }
        });
        let calls = runner.calls.clone();

        let devices = client(runner).list_devices("trace-1");

        assert_eq!(
            devices,
            vec![
                Device {
                    serial: "R58M123ABC".to_string(),
                    model: "SM G973F".to_string(),
                    os_version: "12".to_string(),
                },
                Device {
                    serial: "emulator-5554".to_string(),
                    model: "sdk gphone64 arm64".to_string(),
                    os_version: "?".to_string(),
                },
            ]
        );
        let calls = calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].args, vec!["devices", "-l"]);
        assert_eq!(calls[0].timeout, Duration::from_secs(10));
        assert_eq!(calls[1].timeout, Duration::from_secs(2));
    }

    #[test]
    fn empty_getprop_output_falls_back_to_placeholder() {
        let runner = ScriptedRunner::new(|args| {
            if args[0] == "devices" {
                ok("List of devices attached\nemulator-5554\tdevice\n")
            } else {
                ok("\n")
            }
        });
        let devices = client(runner).list_devices("trace-2");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].model, "Unknown");
        assert_eq!(devices[0].os_version, "?");
    }

    #[test]
    fn listing_failure_yields_no_devices() {
        let failing = ScriptedRunner::new(|_| exit(1, "error: cannot connect to daemon"));
        assert!(client(failing).list_devices("trace-3").is_empty());

        let spawn_error = ScriptedRunner::new(|_| Err(AppError::system("Failed to spawn", "")));
        assert!(client(spawn_error).list_devices("trace-4").is_empty());
    }

    #[test]
    fn missing_adb_yields_no_devices_without_spawning() {
        let runner = ScriptedRunner::new(|_| ok(DEVICES));
        let calls = runner.calls.clone();
        let client = AdbClient::new(None, Box::new(runner), AdbSettings::default());
        assert!(client.list_devices("trace-5").is_empty());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn view_intent_args_with_and_without_serial() {
        assert_eq!(
            build_view_intent_args(Some("emulator-5554"), "app://open?x=1&y=2"),
            vec![
                "-s",
                "emulator-5554",
                "shell",
                "am",
                "start",
                "-a",
                "android.intent.action.VIEW",
                "-d",
                "app://open?x=1&y=2",
            ]
        );
        assert_eq!(
            build_view_intent_args(None, "app://home"),
            vec!["shell", "am", "start", "-a", "android.intent.action.VIEW", "-d", "app://home"]
        );
    }

    #[test]
    fn start_view_intent_reports_non_zero_exit() {
        let runner = ScriptedRunner::new(|_| exit(1, "error: no devices/emulators found"));
        let err = client(runner)
            .start_view_intent(None, "app://home", "trace-6")
            .expect_err("expected failure");
        assert_eq!(err.code, "ERR_DEPENDENCY");
        assert_eq!(err.trace_id, "trace-6");
        assert!(err.error.contains("no devices"));
    }

    #[test]
    fn start_view_intent_requires_adb() {
        let runner = ScriptedRunner::new(|_| ok(""));
        let client = AdbClient::new(None, Box::new(runner), AdbSettings::default());
        let err = client
            .start_view_intent(Some("X"), "app://home", "trace-7")
            .expect_err("expected missing adb");
        assert_eq!(err.code, "ERR_DEPENDENCY");
    }

    #[test]
    fn check_reports_version_output() {
        let runner = ScriptedRunner::new(|_| ok("Android Debug Bridge version 1.0.41\n"));
        let info = client(runner).check("trace-8");
        assert!(info.available);
        assert_eq!(info.version_output, "Android Debug Bridge version 1.0.41");

        let missing = AdbClient::new(
            None,
            Box::new(ScriptedRunner::new(|_| ok(""))),
            AdbSettings::default(),
        );
        assert!(!missing.check("trace-9").available);
    }
}
