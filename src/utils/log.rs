// src/utils/log.rs

//! Server-style log helpers on top of the `log` facade.
//!
//! Pipeline stages report through these so multi-line reports (headers,
//! steps, summaries) stay consistently formatted whatever logger the binary
//! installs.

/// Log a warning message
pub fn warn(message: &str) {
    ::log::warn!("{message}");
}

/// Log a progress update
pub fn progress(done: usize, total: usize, message: &str) {
    ::log::info!("{message} ({}%) - {done} of {total}", percent(done, total));
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    ::log::info!("[STEP {step_num}/{total}] {message}");
}

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    ::log::info!("{border}");
    ::log::info!("  {title}");
    ::log::info!("{border}");
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    ::log::info!("    {message}");
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    ::log::info!("[SUMMARY] {title}");
    for (key, value) in items {
        ::log::info!("    {key}: {value}");
    }
}

/// Rounded percentage of `done` out of `total`; zero when there is nothing to do.
pub fn percent(done: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        ((done as f64 / total as f64) * 100.0).round() as usize
    }
}
