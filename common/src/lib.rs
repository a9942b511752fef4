use std::fmt;

pub mod cli;
pub mod ffi;
pub mod logging;
pub mod util;

pub use logging::{BufferSink, LogCrateSink, LogSink, Logger};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub version_major: u32,
    pub version_minor: u32,
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.name, self.version_major, self.version_minor)
    }
}

/// Services the host hands to a module when initializing it.
///
/// The module keeps the logger as its logging destination until `shutdown`.
#[derive(Debug, Clone, Default)]
pub struct HostServices {
    pub log: Logger,
}

impl HostServices {
    pub fn new(log: Logger) -> Self {
        Self { log }
    }
}

/// An auxiliary subsystem with a host-managed lifecycle.
///
/// The host calls `info` at any time, `initialize` once after loading and `shutdown` once
/// before unloading. A module that fails to initialize reports it by returning `false`; the
/// host never retries.
pub trait Module : Send {
    fn info(&self) -> ModuleInfo;
    fn initialize(&mut self, host: HostServices) -> bool;
    fn shutdown(&mut self);

    fn as_any(&mut self) -> &mut dyn std::any::Any;
}
