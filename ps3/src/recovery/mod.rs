use std::any::Any;

use anyhow::{bail, Result};
use common::{HostServices, Logger, Module, ModuleInfo};

mod hle;

pub use hle::{EntryBlock, Report, Step};

/// High level emulation of the recovery firmware: the BIOS-like bootstrap and recovery menu.
#[derive(Debug, Default)]
pub struct RecoveryModule {
    host: Option<HostServices>,
}

impl RecoveryModule {
    pub const INFO: ModuleInfo = ModuleInfo { name: "recovery", version_major: 0, version_minor: 1 };

    /// Runs the recovery routine. With a firmware image, its entry block is decoded during the
    /// flash check.
    pub fn entry(&mut self, firmware: Option<&[u8]>) -> Result<Report> {
        let Some(host) = &self.host else {
            bail!("{}: entry called before initialize", Self::INFO.name);
        };
        hle::run(&host.log, firmware)
    }

    /// The host's logger once initialized.
    pub fn logger(&self) -> Logger {
        match &self.host {
            Some(host) => host.log.clone(),
            None => Logger::with_target(Self::INFO.name),
        }
    }
}

impl Module for RecoveryModule {
    fn info(&self) -> ModuleInfo {
        Self::INFO
    }

    fn initialize(&mut self, host: HostServices) -> bool {
        host.log.info(format_args!("{}: initialized", Self::INFO.name));
        self.host = Some(host);
        true
    }

    fn shutdown(&mut self) {
        if let Some(host) = self.host.take() {
            host.log.info(format_args!("{}: shut down", Self::INFO.name));
        }
    }

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use cell::Terminator;
    use common::{BufferSink, Logger};

    fn initialized() -> (RecoveryModule, Arc<BufferSink>) {
        let sink = Arc::new(BufferSink::new());
        let mut module = RecoveryModule::default();
        assert!(module.initialize(HostServices::new(Logger::new(sink.clone()))));
        (module, sink)
    }

    #[test]
    fn lifecycle() {
        let (mut module, sink) = initialized();
        assert_eq!(module.info().to_string(), "recovery v0.1");
        assert!(sink.contains("recovery: initialized"));

        module.shutdown();
        assert!(sink.contains("recovery: shut down"));

        // a second shutdown has nothing to report
        module.shutdown();
        assert_eq!(sink.lines().iter().filter(|(_, line)| line.contains("shut down")).count(), 1);
    }

    #[test]
    fn entry_requires_initialize() {
        let mut module = RecoveryModule::default();
        assert!(module.entry(None).is_err());
    }

    #[test]
    fn entry_without_firmware() {
        let (mut module, sink) = initialized();
        let report = module.entry(None).unwrap();
        assert_eq!(report.steps, vec![Step::Init, Step::CheckFlash, Step::Menu, Step::Done]);
        assert!(report.entry_block.is_none());
        assert!(sink.contains("no firmware image"));
    }

    #[test]
    fn entry_decodes_firmware() {
        let (mut module, sink) = initialized();
        let firmware = [0x60, 0x00, 0x00, 0x00, 0x4e, 0x80, 0x00, 0x20];
        let report = module.entry(Some(&firmware)).unwrap();
        assert_eq!(report.entry_block, Some(EntryBlock { instructions: 2, terminator: Terminator::Return }));
        assert!(sink.contains("entry block: 2 instructions, return"));
    }

    #[test]
    fn truncated_firmware_fails() {
        let (mut module, _) = initialized();
        assert!(module.entry(Some(&[0x60, 0x00])).is_err());
    }
}
