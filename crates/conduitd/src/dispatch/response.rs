//! Result payloads for methods that return structured objects.

use serde_json::{Value, json};

use crate::executor::{CommandError, LongRunningMethod, MethodTimeoutTable};

/// Pointer attached to long-running results.
pub(crate) const TIMEOUT_INFO: &str = "Call getMethodMetadata() for expected operation durations";

const PLUGIN_NAME: &str = env!("CARGO_PKG_NAME");
const VERSION_NOTE: &str =
    "Some operations may take several minutes. Call getMethodMetadata() for timeout information.";
const METADATA_DESCRIPTION: &str =
    "Provides metadata about methods, including expected operation durations in seconds";
const METADATA_NOTE: &str = "Use setMethodMetadata() to customize timeout values";

/// `{success, message, timeoutInfo}` for build, run, clean and session load.
pub(crate) fn long_running(
    method: LongRunningMethod,
    outcome: &Result<(), CommandError>,
    timeouts: &MethodTimeoutTable,
) -> Value {
    let seconds = timeouts
        .get(method)
        .unwrap_or_else(|| method.default_timeout_secs());
    let label = label(method);
    let message = match outcome {
        Ok(()) => format!("{label} started. This operation may take up to {seconds} seconds."),
        Err(error) => format!(
            "{label} not started: {error}. This operation may take up to {seconds} seconds."
        ),
    };
    json!({
        "success": outcome.is_ok(),
        "message": message,
        "timeoutInfo": TIMEOUT_INFO,
    })
}

/// `{output, timeoutInfo}` for `debug`.
pub(crate) fn debug_report(output: String) -> Value {
    json!({
        "output": output,
        "timeoutInfo": TIMEOUT_INFO,
    })
}

/// `{version, plugin, note}` for `getVersion`.
pub(crate) fn version(host_version: String) -> Value {
    json!({
        "version": host_version,
        "plugin": PLUGIN_NAME,
        "note": VERSION_NOTE,
    })
}

/// `{expectedDurations, description, note}` for `getMethodMetadata`.
pub(crate) fn method_metadata(timeouts: &MethodTimeoutTable) -> Value {
    json!({
        "expectedDurations": timeouts.expected_durations(),
        "description": METADATA_DESCRIPTION,
        "note": METADATA_NOTE,
    })
}

const fn label(method: LongRunningMethod) -> &'static str {
    match method {
        LongRunningMethod::Build => "Build",
        LongRunningMethod::RunProject => "Project run",
        LongRunningMethod::CleanProject => "Project clean",
        LongRunningMethod::LoadSession => "Session loading",
        LongRunningMethod::Debug => "Debug session",
    }
}
