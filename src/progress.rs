use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use verifalia::api::{time_span, Validation, ValidationOverview, WaitEvent, WaitEventSink};

fn spinner_style(template: &str, tick_chars: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(tick_chars)
}

/// A spinner shown while a request runs, then fed by completion-wait
/// events if the job has to be polled.
pub struct WaitProgress {
    bar: ProgressBar,
    polls: usize,
}

impl WaitProgress {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style("{spinner:.green} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar, polls: 0 }
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }

    fn render(&mut self, event: WaitEvent, overview: Option<&ValidationOverview>) {
        match event {
            WaitEvent::LoopStarted => {
                self.bar.set_style(spinner_style("⏳ {msg} {spinner:.yellow}", "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
                self.bar.set_message("Waiting for the job to complete...");
            }
            WaitEvent::BeforePoll => self.polls += 1,
            WaitEvent::AfterPoll => {
                if let Some(overview) = overview {
                    self.bar.set_message(describe(overview, self.polls));
                }
            }
            WaitEvent::LoopFinished => self.bar.finish_and_clear(),
        }
    }
}

fn describe(overview: &ValidationOverview, polls: usize) -> String {
    let mut message = format!("Job {} is {}", overview.id, overview.status);
    if let Some(percentage) = overview.percentage() {
        message.push_str(&format!(" ({:.0}%)", percentage * 100.0));
    }
    if let Some(remaining) = overview
        .progress
        .as_ref()
        .and_then(|progress| progress.estimated_time_remaining)
    {
        message.push_str(&format!(", about {} left", time_span::format(&remaining)));
    }
    message.push_str(&format!(" [check #{polls}]"));
    message
}

impl WaitEventSink<Validation> for WaitProgress {
    fn on_event(&mut self, event: WaitEvent, snapshot: Option<&Validation>) {
        self.render(event, snapshot.map(|validation| &validation.overview));
    }
}

impl WaitEventSink<ValidationOverview> for WaitProgress {
    fn on_event(&mut self, event: WaitEvent, snapshot: Option<&ValidationOverview>) {
        self.render(event, snapshot);
    }
}
