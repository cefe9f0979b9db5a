use metrics::counter;
use once_cell::sync::OnceCell;
use std::{panic, thread};
use tracing::{error, info};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Log panics (thread, location, message) and count them in
/// `frog_panics_total`, then defer to the previous hook.
pub fn install_hook() {
    if INSTALLED.set(()).is_err() {
        return;
    }

    let prev = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let thread = thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("<non-string panic payload>");

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".into());

        error!(thread = %name, %location, %payload, "panic captured");
        counter!("frog_panics_total").increment(1);

        prev(panic_info);
    }));

    info!("panic hook installed");
}
