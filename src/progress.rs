use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const TICKS: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Progress on stderr for a download of `len` bytes.
/// - Known length: yellow spinner, bar, byte counter and percentage.
/// - Unknown length: spinner with a running byte count.
pub fn download_bar(len: Option<u64>) -> ProgressBar {
    let s = match len {
        Some(_) => style("\x1b[33m{spinner}\x1b[0m {msg} [{bar:30}] {bytes}/{total_bytes} ({percent}%)")
            .progress_chars("=> "),
        None => style("\x1b[33m{spinner}\x1b[0m {wide_msg} {bytes}"),
    };
    let pb = ProgressBar::with_draw_target(len, ProgressDrawTarget::stderr());
    pb.set_style(s.tick_strings(&TICKS));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Green check mark followed by `msg`.
pub fn finish_ok(pb: &ProgressBar, msg: String) {
    pb.set_style(style("\x1b[32m✔\x1b[0m {wide_msg}"));
    pb.finish_with_message(msg);
}

/// Red cross followed by `msg`.
pub fn finish_err(pb: &ProgressBar, msg: String) {
    pb.set_style(style("\x1b[31m✘\x1b[0m {wide_msg}"));
    pb.finish_with_message(msg);
}
