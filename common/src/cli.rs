use clap::{Args, ValueEnum};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Args)]
#[clap(next_help_heading = "Global Options")]
pub struct GlobalOpts {
    /// Default log filter, overridden by RUST_LOG
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// Parses decimal or `0x` prefixed hexadecimal addresses.
pub fn parse_address(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid address `{}`: {}", s, e))
}

/// Registers the modules built into the host binary.
///
/// Generates a `Modules` enum usable as a clap value, `create_module` to instantiate one and
/// `all_modules` listing every registered variant. Each module type must implement
/// `common::Module + Default`.
#[macro_export]
macro_rules! register_modules {
    { $( $module_type:ident ),* $(,)? } => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        enum Modules {
            $(
                #[allow(non_camel_case_types)]
                $module_type
            ),*
        }

        impl clap::ValueEnum for Modules {
            fn value_variants<'a>() -> &'a [Self] { &[$( Modules::$module_type ),*] }
            fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
                use common::Module;
                match self {
                    $( Modules::$module_type => {
                        Some(clap::builder::PossibleValue::new(<$module_type>::default().info().name))
                    }),*
                }
            }
        }

        fn create_module(module: Modules) -> Box<dyn common::Module> {
            match module {
                $( Modules::$module_type => Box::new(<$module_type>::default()) ),*
            }
        }

        fn all_modules() -> Vec<Modules> {
            vec![$( Modules::$module_type ),*]
        }
    };
}
