use anyhow::{anyhow, Result};
use common::{HostServices, Logger, Module, ModuleInfo};
use ps3::recovery::Report;
use ps3::RecoveryModule;

/// Owns the loaded modules and drives their lifecycle.
///
/// Modules are shut down in reverse load order, either by `unload_all` or when the host is
/// dropped.
pub struct ModuleHost {
    log: Logger,
    modules: Vec<Box<dyn Module>>,
}

impl ModuleHost {
    pub fn new(log: Logger) -> Self {
        Self { log, modules: Vec::new() }
    }

    /// Loads and initializes `module`. One that fails to initialize is dropped again.
    pub fn load(&mut self, mut module: Box<dyn Module>) -> bool {
        let info = module.info();
        self.log.info(format_args!("loaded {}", info));

        if !module.initialize(HostServices::new(self.log.clone())) {
            self.log.warn(format_args!("{}: initialize failed, unloading", info.name));
            return false;
        }
        self.modules.push(module);
        true
    }

    pub fn loaded(&self) -> Vec<ModuleInfo> {
        self.modules.iter().map(|module| module.info()).collect()
    }

    pub fn find<T: Module + 'static>(&mut self) -> Option<&mut T> {
        self.modules.iter_mut().find_map(|module| module.as_any().downcast_mut::<T>())
    }

    pub fn boot_recovery(&mut self, firmware: Option<&[u8]>) -> Result<Report> {
        let recovery = self
            .find::<RecoveryModule>()
            .ok_or_else(|| anyhow!("{} is not loaded", RecoveryModule::INFO.name))?;
        recovery.entry(firmware)
    }

    pub fn unload_all(&mut self) {
        while let Some(mut module) = self.modules.pop() {
            module.shutdown();
            self.log.info(format_args!("unloaded {}", module.info()));
        }
    }
}

impl Drop for ModuleHost {
    fn drop(&mut self) {
        self.unload_all();
    }
}
