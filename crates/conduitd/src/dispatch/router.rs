//! Routing of decoded requests to executor operations.

use serde_json::Value;
use tracing::{debug, warn};

use super::errors::DispatchError;
use super::method::{Method, MethodName};
use super::response;
use crate::executor::{CommandError, CommandExecutor, LongRunningMethod};
use crate::protocol::{Request, Response, decode};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Turns request units into responses by way of the [`CommandExecutor`].
///
/// Every unit yields exactly one response. Protocol and dispatch failures
/// become error responses; executor failures become negative results.
#[derive(Debug)]
pub struct Dispatcher {
    executor: CommandExecutor,
}

impl Dispatcher {
    /// Creates a dispatcher that owns `executor`.
    #[must_use]
    pub const fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    /// Decodes and dispatches one framed unit.
    pub fn handle_unit(&mut self, unit: &[u8]) -> Response {
        match decode(unit) {
            Ok(request) => self.dispatch(request),
            Err(rejection) => {
                warn!(
                    target: DISPATCH_TARGET,
                    id = %rejection.id,
                    error = %rejection.error,
                    "rejected request"
                );
                rejection.into_response()
            }
        }
    }

    /// Dispatches a validated request.
    pub fn dispatch(&mut self, request: Request) -> Response {
        let Request { id, method, params } = request;
        match Method::from_request(&method, params) {
            Ok(method) => {
                debug!(target: DISPATCH_TARGET, method = %method.name(), %id, "dispatching");
                if let Some(long_running) = method.name().long_running() {
                    debug!(
                        target: DISPATCH_TARGET,
                        method = %long_running,
                        expected_secs = self.executor.timeouts().get(long_running),
                        "long-running operation requested"
                    );
                }
                Response::success(id, self.invoke(method))
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %id, error = %error, "dispatch failed");
                dispatch_failure(id, &error)
            }
        }
    }

    fn invoke(&mut self, method: Method) -> Value {
        let executor = &mut self.executor;
        match method {
            Method::Build => long_running(executor, LongRunningMethod::Build, CommandExecutor::build),
            Method::RunProject => {
                long_running(executor, LongRunningMethod::RunProject, CommandExecutor::run_project)
            }
            Method::CleanProject => long_running(
                executor,
                LongRunningMethod::CleanProject,
                CommandExecutor::clean_project,
            ),
            Method::LoadSession(params) => long_running(
                executor,
                LongRunningMethod::LoadSession,
                |executor| executor.load_session(&params.session_name),
            ),
            Method::Debug => response::debug_report(executor.debug()),
            Method::StopDebug => Value::String(executor.stop_debug()),
            Method::GetVersion => response::version(executor.version()),
            Method::OpenFile(params) => Value::Bool(executor.open_file(&params.path)),
            Method::ListProjects => Value::from(executor.list_projects()),
            Method::ListBuildConfigs => Value::from(executor.list_build_configs()),
            Method::SwitchToBuildConfig(params) => {
                Value::Bool(executor.switch_to_build_config(&params.name))
            }
            Method::Quit => Value::Bool(executor.quit()),
            Method::GetCurrentProject => Value::String(executor.current_project()),
            Method::GetCurrentBuildConfig => Value::String(executor.current_build_config()),
            Method::ListOpenFiles => Value::from(executor.list_open_files()),
            Method::ListSessions => Value::from(executor.list_sessions()),
            Method::GetCurrentSession => Value::String(executor.current_session()),
            Method::SaveSession => Value::Bool(executor.save_session()),
            Method::ListIssues => Value::from(executor.list_issues()),
            Method::ListMethods => MethodName::ALL
                .iter()
                .map(|name| Value::from(name.as_str()))
                .collect(),
            Method::GetMethodMetadata => response::method_metadata(executor.timeouts()),
            Method::SetMethodMetadata(params) => Value::String(
                executor.set_method_metadata(&params.method, params.timeout_seconds),
            ),
        }
    }
}

fn long_running<F>(executor: &CommandExecutor, method: LongRunningMethod, operation: F) -> Value
where
    F: FnOnce(&CommandExecutor) -> Result<(), CommandError>,
{
    let outcome = operation(executor);
    if let Err(error) = &outcome {
        debug!(target: DISPATCH_TARGET, %method, error = %error, "operation not started");
    }
    response::long_running(method, &outcome, executor.timeouts())
}

fn dispatch_failure(id: Value, error: &DispatchError) -> Response {
    Response::failure(id, error.code(), error.to_string())
}
