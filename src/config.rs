use std::{str::FromStr, sync::LazyLock};

/// Interpreter defaults taken from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SkaConfig {
    /// Stop with an error after this many executed instructions.
    pub op_limit: u64,
    /// Maximum number of nested sources (loop iterations and calls being replayed).
    pub max_depth: usize,
    /// Dump the interpreter state after every instruction.
    pub debug: bool,
}

impl Default for SkaConfig {
    fn default() -> Self {
        SkaConfig { op_limit: u64::MAX, max_depth: 1 << 20, debug: false }
    }
}

fn parse_env_opt<T>(key: &str) -> Option<T>
where
    T: FromStr + 'static, <T as FromStr>::Err: std::fmt::Display
{
    if let Ok(mut val) = std::env::var(key) {
        if std::any::TypeId::of::<T>() == std::any::TypeId::of::<bool>() {
            val = val.to_lowercase();
            if val == "1" || val == "yes" {
                val = "true".to_string();
            } else if val == "0" || val == "no" {
                val = "false".to_string();
            }
        }
        match val.parse::<T>() {
            Ok(v) => Some(v),
            Err(err) => if val == "" {
                None
            } else {
                tracing::warn!("ignoring env var {key} with value {val}: {err}");
                None
            }
        }
    } else {
        None
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + 'static, <T as FromStr>::Err: std::fmt::Display
{
    parse_env_opt(key).unwrap_or(default)
}

fn create_config() -> SkaConfig {
    let defaults = SkaConfig::default();
    SkaConfig {
        op_limit: parse_env("SKA_OP_LIMIT", defaults.op_limit),
        max_depth: parse_env("SKA_MAX_DEPTH", defaults.max_depth),
        debug: parse_env("SKA_DEBUG", defaults.debug),
    }
}

static CELL: LazyLock<SkaConfig> = LazyLock::new(|| create_config());

pub fn get_config() -> &'static SkaConfig {
    &CELL
}
