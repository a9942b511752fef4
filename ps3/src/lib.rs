//! System level pieces of the PS3: high level emulated firmware modules built on the Cell
//! decoder.
//!
//! Built as a `cdylib` as well, exporting the recovery module through the C host bridge. On
//! top of the lifecycle entry points it exports `GSCX_RecoveryEntry() -> bool`.

use std::panic;

pub mod recovery;

pub use recovery::RecoveryModule;

common::export_module!(RecoveryModule);

/// Runs the recovery routine without a firmware image.
///
/// Returns false if the module is not initialized or the routine failed, the reason is
/// logged through the host.
#[no_mangle]
pub extern "C" fn GSCX_RecoveryEntry() -> bool {
    let result = panic::catch_unwind(|| {
        gscx_with_module(|module| match module.entry(None) {
            Ok(_) => true,
            Err(err) => {
                module.logger().error(format_args!("{:#}", err));
                false
            }
        })
    });
    result.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    // The only test touching the exported module instance.
    #[test]
    fn c_entry_points() {
        assert!(!GSCX_RecoveryEntry());

        assert!(unsafe { GSCX_Initialize(ptr::null()) });
        assert!(GSCX_RecoveryEntry());

        GSCX_Shutdown();
        assert!(!GSCX_RecoveryEntry());
    }
}
