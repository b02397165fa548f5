use jdkwatch_util::env_flag;

use crate::types::ScopeContext;

pub const HEADLESS_ENV: &str = "JDKWATCH_HEADLESS";
pub const UPDATES_ENV: &str = "JDKWATCH_UPDATES";

/// Consulted before every scheduled action, event trigger and notification
/// mutation. Side-effect free, re-evaluated at each entry point rather than
/// cached, since the flags can flip while the process runs.
pub trait UpdateCheckGate: Send + Sync {
    fn enabled(&self, scope: &ScopeContext) -> bool;
}

/// Off for template scopes, headless runs, or an explicitly disabled
/// `JDKWATCH_UPDATES` flag.
pub struct EnvGate;

impl UpdateCheckGate for EnvGate {
    fn enabled(&self, scope: &ScopeContext) -> bool {
        if scope.is_template() {
            return false;
        }
        if env_flag(HEADLESS_ENV, false) {
            return false;
        }
        env_flag(UPDATES_ENV, true)
    }
}
