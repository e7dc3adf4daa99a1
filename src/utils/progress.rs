use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn create_progress_bar(len: u64, title: impl Into<String>) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(
            "{msg} ({pos}/{len})\n[{bar:40.cyan/blue}] {percent}% • {elapsed_precise} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");

    ProgressBar::new(len)
        .with_message(title.into())
        .with_style(style)
}

pub fn create_spinner(title: impl Into<String>) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg} • {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let spinner = ProgressBar::new_spinner()
        .with_message(title.into())
        .with_style(style);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
