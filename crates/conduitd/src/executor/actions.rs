//! Action identifiers tried, in order, when triggering run and debug.

/// Run actions; the first that resolves is triggered.
pub const RUN_ACTION_IDS: [&str; 3] = [
    "ProjectExplorer.Run",
    "ProjectExplorer.RunProject",
    "ProjectExplorer.RunStartupProject",
];

/// Debug actions; the first that resolves is triggered.
pub const DEBUG_ACTION_IDS: [&str; 6] = [
    "Debugger.StartDebugging",
    "ProjectExplorer.StartDebugging",
    "Debugger.Debug",
    "ProjectExplorer.Debug",
    "Debugger.StartDebuggingOfStartupProject",
    "ProjectExplorer.StartDebuggingOfStartupProject",
];

/// Stop-debugging actions; the first that resolves is triggered.
pub const STOP_DEBUG_ACTION_IDS: [&str; 5] = [
    "Debugger.StopDebugger",
    "Debugger.Stop",
    "ProjectExplorer.StopDebugging",
    "ProjectExplorer.Stop",
    "Debugger.StopDebugging",
];
