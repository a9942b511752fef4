use std::any::Any;

use common::{HostServices, Logger, Module, ModuleInfo};

use crate::context::{Arch, DecodeConfig, DecodeContext};
use crate::decoder::Decoder;

/// The Cell CPU front end as a host module. Decoders it hands out log through the host.
#[derive(Debug, Default)]
pub struct CellModule {
    host: Option<HostServices>,
}

impl CellModule {
    pub const INFO: ModuleInfo = ModuleInfo { name: "cpu_cell", version_major: 0, version_minor: 1 };

    pub fn is_initialized(&self) -> bool {
        self.host.is_some()
    }

    pub fn decoder(&self, arch: Arch, base: u64, config: DecodeConfig) -> Decoder {
        Decoder::new(DecodeContext::new(arch, base), config, self.logger())
    }

    fn logger(&self) -> Logger {
        match &self.host {
            Some(host) => host.log.clone(),
            None => Logger::with_target("cell"),
        }
    }
}

impl Module for CellModule {
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
    use common::BufferSink;

    #[test]
    fn decoders_log_through_the_host() {
        let sink = Arc::new(BufferSink::new());
        let mut module = CellModule::default();
        assert!(module.initialize(HostServices::new(Logger::new(sink.clone()))));
        assert!(module.is_initialized());
        assert!(sink.contains("cpu_cell: initialized"));

        let decoder = module.decoder(Arch::Spu, 0, DecodeConfig::default());
        let block = decoder.decode_block(&0x4020_0000u32.to_be_bytes()).unwrap();
        assert_eq!(block.len(), 1);
        assert!(sink.contains("spu: block 0x0..0x4"));

        module.shutdown();
        assert!(!module.is_initialized());
        assert!(sink.contains("cpu_cell: shut down"));
    }
}
