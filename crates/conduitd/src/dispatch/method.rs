//! The fixed method table and its typed parameters.

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::DispatchError;
use crate::executor::LongRunningMethod;

/// Every method the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodName {
    /// `build`
    Build,
    /// `debug`
    Debug,
    /// `stopDebug`
    StopDebug,
    /// `getVersion`
    GetVersion,
    /// `openFile`
    OpenFile,
    /// `listProjects`
    ListProjects,
    /// `listBuildConfigs`
    ListBuildConfigs,
    /// `switchToBuildConfig`
    SwitchToBuildConfig,
    /// `quit`
    Quit,
    /// `getCurrentProject`
    GetCurrentProject,
    /// `getCurrentBuildConfig`
    GetCurrentBuildConfig,
    /// `runProject`
    RunProject,
    /// `cleanProject`
    CleanProject,
    /// `listOpenFiles`
    ListOpenFiles,
    /// `listSessions`
    ListSessions,
    /// `getCurrentSession`
    GetCurrentSession,
    /// `loadSession`
    LoadSession,
    /// `saveSession`
    SaveSession,
    /// `listIssues`
    ListIssues,
    /// `listMethods`
    ListMethods,
    /// `getMethodMetadata`
    GetMethodMetadata,
    /// `setMethodMetadata`
    SetMethodMetadata,
}

impl MethodName {
    /// Every method, in the order `listMethods` reports them.
    pub const ALL: [Self; 22] = [
        Self::Build,
        Self::Debug,
        Self::StopDebug,
        Self::GetVersion,
        Self::OpenFile,
        Self::ListProjects,
        Self::ListBuildConfigs,
        Self::SwitchToBuildConfig,
        Self::Quit,
        Self::GetCurrentProject,
        Self::GetCurrentBuildConfig,
        Self::RunProject,
        Self::CleanProject,
        Self::ListOpenFiles,
        Self::ListSessions,
        Self::GetCurrentSession,
        Self::LoadSession,
        Self::SaveSession,
        Self::ListIssues,
        Self::ListMethods,
        Self::GetMethodMetadata,
        Self::SetMethodMetadata,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Debug => "debug",
            Self::StopDebug => "stopDebug",
            Self::GetVersion => "getVersion",
            Self::OpenFile => "openFile",
            Self::ListProjects => "listProjects",
            Self::ListBuildConfigs => "listBuildConfigs",
            Self::SwitchToBuildConfig => "switchToBuildConfig",
            Self::Quit => "quit",
            Self::GetCurrentProject => "getCurrentProject",
            Self::GetCurrentBuildConfig => "getCurrentBuildConfig",
            Self::RunProject => "runProject",
            Self::CleanProject => "cleanProject",
            Self::ListOpenFiles => "listOpenFiles",
            Self::ListSessions => "listSessions",
            Self::GetCurrentSession => "getCurrentSession",
            Self::LoadSession => "loadSession",
            Self::SaveSession => "saveSession",
            Self::ListIssues => "listIssues",
            Self::ListMethods => "listMethods",
            Self::GetMethodMetadata => "getMethodMetadata",
            Self::SetMethodMetadata => "setMethodMetadata",
        }
    }

    /// Looks up a method by its exact, case-sensitive wire name.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownMethod`] when the name is not in the
    /// table.
    pub fn parse(name: &str) -> Result<Self, DispatchError> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == name)
            .ok_or_else(|| DispatchError::unknown_method(name))
    }

    /// Advisory-timeout key for long-running methods.
    #[must_use]
    pub const fn long_running(self) -> Option<LongRunningMethod> {
        match self {
            Self::Build => Some(LongRunningMethod::Build),
            Self::Debug => Some(LongRunningMethod::Debug),
            Self::RunProject => Some(LongRunningMethod::RunProject),
            Self::CleanProject => Some(LongRunningMethod::CleanProject),
            Self::LoadSession => Some(LongRunningMethod::LoadSession),
            _ => None,
        }
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Params for `openFile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenFileParams {
    /// File to open.
    pub path: String,
}

/// Params for `switchToBuildConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwitchToBuildConfigParams {
    /// Build configuration display name.
    pub name: String,
}

/// Params for `loadSession`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSessionParams {
    /// Session to load.
    pub session_name: String,
}

/// Params for `setMethodMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMethodMetadataParams {
    /// Long-running method to adjust.
    pub method: String,
    /// New advisory duration; negative values are rejected by the executor.
    pub timeout_seconds: i64,
}

/// A resolved request, carrying typed params where the method takes any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `build`
    Build,
    /// `debug`
    Debug,
    /// `stopDebug`
    StopDebug,
    /// `getVersion`
    GetVersion,
    /// `openFile`
    OpenFile(OpenFileParams),
    /// `listProjects`
    ListProjects,
    /// `listBuildConfigs`
    ListBuildConfigs,
    /// `switchToBuildConfig`
    SwitchToBuildConfig(SwitchToBuildConfigParams),
    /// `quit`
    Quit,
    /// `getCurrentProject`
    GetCurrentProject,
    /// `getCurrentBuildConfig`
    GetCurrentBuildConfig,
    /// `runProject`
    RunProject,
    /// `cleanProject`
    CleanProject,
    /// `listOpenFiles`
    ListOpenFiles,
    /// `listSessions`
    ListSessions,
    /// `getCurrentSession`
    GetCurrentSession,
    /// `loadSession`
    LoadSession(LoadSessionParams),
    /// `saveSession`
    SaveSession,
    /// `listIssues`
    ListIssues,
    /// `listMethods`
    ListMethods,
    /// `getMethodMetadata`
    GetMethodMetadata,
    /// `setMethodMetadata`
    SetMethodMetadata(SetMethodMetadataParams),
}

impl Method {
    /// Resolves a method name and validates its params.
    ///
    /// Methods without params ignore whatever `params` holds.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownMethod`] for names outside the table
    /// and [`DispatchError::InvalidParams`] when a method's params are not
    /// an object with the required keys.
    pub fn from_request(name: &str, params: Option<Value>) -> Result<Self, DispatchError> {
        let method = MethodName::parse(name)?;
        let resolved = match method {
            MethodName::Build => Self::Build,
            MethodName::Debug => Self::Debug,
            MethodName::StopDebug => Self::StopDebug,
            MethodName::GetVersion => Self::GetVersion,
            MethodName::OpenFile => Self::OpenFile(typed_params(method, params)?),
            MethodName::ListProjects => Self::ListProjects,
            MethodName::ListBuildConfigs => Self::ListBuildConfigs,
            MethodName::SwitchToBuildConfig => {
                Self::SwitchToBuildConfig(typed_params(method, params)?)
            }
            MethodName::Quit => Self::Quit,
            MethodName::GetCurrentProject => Self::GetCurrentProject,
            MethodName::GetCurrentBuildConfig => Self::GetCurrentBuildConfig,
            MethodName::RunProject => Self::RunProject,
            MethodName::CleanProject => Self::CleanProject,
            MethodName::ListOpenFiles => Self::ListOpenFiles,
            MethodName::ListSessions => Self::ListSessions,
            MethodName::GetCurrentSession => Self::GetCurrentSession,
            MethodName::LoadSession => Self::LoadSession(typed_params(method, params)?),
            MethodName::SaveSession => Self::SaveSession,
            MethodName::ListIssues => Self::ListIssues,
            MethodName::ListMethods => Self::ListMethods,
            MethodName::GetMethodMetadata => Self::GetMethodMetadata,
            MethodName::SetMethodMetadata => {
                Self::SetMethodMetadata(typed_params(method, params)?)
            }
        };
        Ok(resolved)
    }

    /// Name of the method.
    #[must_use]
    pub const fn name(&self) -> MethodName {
        match self {
            Self::Build => MethodName::Build,
            Self::Debug => MethodName::Debug,
            Self::StopDebug => MethodName::StopDebug,
            Self::GetVersion => MethodName::GetVersion,
            Self::OpenFile(_) => MethodName::OpenFile,
            Self::ListProjects => MethodName::ListProjects,
            Self::ListBuildConfigs => MethodName::ListBuildConfigs,
            Self::SwitchToBuildConfig(_) => MethodName::SwitchToBuildConfig,
            Self::Quit => MethodName::Quit,
            Self::GetCurrentProject => MethodName::GetCurrentProject,
            Self::GetCurrentBuildConfig => MethodName::GetCurrentBuildConfig,
            Self::RunProject => MethodName::RunProject,
            Self::CleanProject => MethodName::CleanProject,
            Self::ListOpenFiles => MethodName::ListOpenFiles,
            Self::ListSessions => MethodName::ListSessions,
            Self::GetCurrentSession => MethodName::GetCurrentSession,
            Self::LoadSession(_) => MethodName::LoadSession,
            Self::SaveSession => MethodName::SaveSession,
            Self::ListIssues => MethodName::ListIssues,
            Self::ListMethods => MethodName::ListMethods,
            Self::GetMethodMetadata => MethodName::GetMethodMetadata,
            Self::SetMethodMetadata(_) => MethodName::SetMethodMetadata,
        }
    }
}

/// Decodes params that must be a JSON object.
///
/// The object check comes first because serde's derived struct visitors also
/// accept positional arrays.
fn typed_params<P>(method: MethodName, params: Option<Value>) -> Result<P, DispatchError>
where
    P: DeserializeOwned,
{
    match params {
        Some(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(|_| DispatchError::invalid_params(method))
        }
        _ => Err(DispatchError::invalid_params(method)),
    }
}
