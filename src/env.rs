use std::ffi::OsStr;
use std::sync::OnceLock;

/// Process-wide toggles read from the environment at startup.
#[derive(Clone, Copy)]
struct Env {
    trace_enabled: bool,
}

/// Must only be set within `init`
static ENV: OnceLock<Env> = OnceLock::new();

pub fn init() {
    let value = Env {
        trace_enabled: var_is("SLATE_TRACE", "1"),
    };
    assert!(
        ENV.set(value).is_ok(),
        "tried to initialize environment state multiple times"
    );
}

/// Whether every executed cycle should also print a trace line.
pub fn is_trace_enabled() -> bool {
    ENV.get()
        .expect("tried to access environment state before initialization")
        .trace_enabled
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
