//! C ABI of the module host bridge.
//!
//! A module built as a dynamic library exports three entry points, generated by
//! [`export_module!`](crate::export_module):
//!
//! - `GSCX_GetModuleInfo() -> ModuleInfoC`
//! - `GSCX_Initialize(host: *const HostServicesC) -> bool`
//! - `GSCX_Shutdown()`
//!
//! The layout of these types is a stable ABI shared with hosts written in other languages.

use std::ffi::{c_char, CString};
use std::fmt;
use std::sync::Arc;

use log::Level;

use crate::{HostServices, LogSink, Logger};

pub type LogFn = extern "C" fn(message: *const c_char);

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct HostServicesC {
    pub log_info: Option<LogFn>,
    pub log_warn: Option<LogFn>,
    pub log_error: Option<LogFn>,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct ModuleInfoC {
    pub name: *const c_char,
    pub version_major: u32,
    pub version_minor: u32,
}

/// Routes log lines to the host's C callbacks.
///
/// Each line is passed NUL-terminated with a trailing newline. Debug and trace lines are
/// dropped, the C table only has info, warn and error slots.
#[derive(Debug, Clone, Copy)]
pub struct CHostSink {
    services: HostServicesC,
}

impl CHostSink {
    pub fn new(services: HostServicesC) -> Self {
        Self { services }
    }
}

impl LogSink for CHostSink {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let callback = match level {
            Level::Error => self.services.log_error,
            Level::Warn => self.services.log_warn,
            Level::Info => self.services.log_info,
            Level::Debug | Level::Trace => None,
        };
        if let Some(callback) = callback {
            let line = c_name(&format!("{}\n", args));
            callback(line.as_ptr());
        }
    }
}

/// Builds a C string, dropping interior NULs rather than failing.
pub fn c_name(name: &str) -> CString {
    CString::new(name.replace('\0', "")).unwrap_or_default()
}

/// Converts the raw host table passed to `GSCX_Initialize`.
///
/// A null pointer yields the default services (logging through the `log` facade).
///
/// # Safety
/// `host` must be null or point to a valid, initialized `HostServicesC`.
pub unsafe fn host_services_from_raw(host: *const HostServicesC) -> HostServices {
    match host.as_ref() {
        Some(services) => HostServices::new(Logger::new(Arc::new(CHostSink::new(*services)))),
        None => HostServices::default(),
    }
}

/// Exports a `Module + Default` type through the C entry points.
///
/// The module instance is created lazily on the first call and lives in a static for the
/// lifetime of the library.
#[macro_export]
macro_rules! export_module {
    ($module:ty) => {
        static GSCX_MODULE: ::std::sync::Mutex<::std::option::Option<$module>> =
            ::std::sync::Mutex::new(None);
        static GSCX_MODULE_NAME: ::std::sync::OnceLock<::std::ffi::CString> =
            ::std::sync::OnceLock::new();

        fn gscx_with_module<R>(f: impl FnOnce(&mut $module) -> R) -> R {
            let mut guard = match GSCX_MODULE.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(guard.get_or_insert_with(<$module as ::std::default::Default>::default))
        }

        #[no_mangle]
        pub extern "C" fn GSCX_GetModuleInfo() -> $crate::ffi::ModuleInfoC {
            let info = gscx_with_module(|module| $crate::Module::info(module));
            let name = GSCX_MODULE_NAME.get_or_init(|| $crate::ffi::c_name(info.name));
            $crate::ffi::ModuleInfoC {
                name: name.as_ptr(),
                version_major: info.version_major,
                version_minor: info.version_minor,
            }
        }

        /// # Safety
        /// `host` must be null or point to a valid `HostServicesC`.
        #[no_mangle]
        pub unsafe extern "C" fn GSCX_Initialize(host: *const $crate::ffi::HostServicesC) -> bool {
            let services = $crate::ffi::host_services_from_raw(host);
            gscx_with_module(|module| $crate::Module::initialize(module, services))
        }

        #[no_mangle]
        pub extern "C" fn GSCX_Shutdown() {
            gscx_with_module(|module| $crate::Module::shutdown(module));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::Mutex;

    static RECEIVED: Mutex<Vec<(char, String)>> = Mutex::new(Vec::new());

    fn record(tag: char, message: *const c_char) {
        let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
        RECEIVED.lock().unwrap().push((tag, text));
    }

    extern "C" fn on_info(message: *const c_char) { record('i', message) }
    extern "C" fn on_warn(message: *const c_char) { record('w', message) }
    extern "C" fn on_error(message: *const c_char) { record('e', message) }

    #[test]
    fn c_sink_routes_levels_to_callbacks() {
        let services = HostServicesC {
            log_info: Some(on_info),
            log_warn: Some(on_warn),
            log_error: Some(on_error),
        };
        let host = unsafe { host_services_from_raw(&services) };

        host.log.info(format_args!("one"));
        host.log.warn(format_args!("two"));
        host.log.error(format_args!("three"));
        host.log.debug(format_args!("dropped"));

        let received = RECEIVED.lock().unwrap().clone();
        assert_eq!(received, vec![
            ('i', "one\n".to_owned()),
            ('w', "two\n".to_owned()),
            ('e', "three\n".to_owned()),
        ]);
    }

    #[test]
    fn missing_callbacks_are_skipped() {
        let sink = CHostSink::new(HostServicesC::default());
        sink.log(Level::Error, format_args!("nobody listens"));
    }

    #[test]
    fn c_name_strips_interior_nul() {
        assert_eq!(c_name("rec\0overy").as_bytes(), b"recovery");
    }
}
