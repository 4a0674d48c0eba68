use crate::engine::{Event, Plugin};
use crate::logger::Logger;
use crate::writer::OriginalWriter;
use std::sync::Mutex;
use std::time::Instant;

/// Number of output lines kept for the error report
const TAIL_LENGTH: usize = 20;

#[derive(Default)]
struct State {
    started_at: Option<Instant>,
    command: Option<String>,
    lines: Vec<String>,
    has_transient_line: bool,
}

/// Renders the deployment progress while the engine output is intercepted
///
/// Writes through the original writer captured at the start of the interception,
/// everything else the engine prints is suppressed.
pub(crate) struct DeployProgress {
    service_name: String,
    is_terminal: bool,
    original: Mutex<Option<OriginalWriter>>,
    state: Mutex<State>,
}

impl DeployProgress {
    pub(crate) fn new(service_name: &str, is_terminal: bool) -> Self {
        Self {
            service_name: service_name.to_string(),
            is_terminal,
            original: Mutex::new(None),
            state: Mutex::new(State::default()),
        }
    }

    pub(crate) fn set_original_writer(&self, writer: OriginalWriter) {
        if let Ok(mut original) = self.original.lock() {
            *original = Some(writer);
        }
    }

    /// Mark the current stage as failed and show the collected output
    pub(crate) fn handle_error(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        let mut output = String::new();

        if state.has_transient_line {
            output.push_str("\r\x1B[K");
            state.has_transient_line = false;
        }

        output.push_str(&format!(
            "{} `{}` {} failed{}\n",
            console::style(with_padding("Error")).red().bold(),
            self.service_name,
            state.command.as_deref().unwrap_or("deployment"),
            elapsed(&state),
        ));

        if !state.lines.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                console::style(state.lines.join("\n")).dim()
            ));
        }

        self.write(&output);
    }

    fn write(&self, output: &str) {
        let original = match self.original.lock() {
            Ok(original) => original.clone(),
            Err(_) => None,
        };

        let Some(original) = original else {
            log::warn!("Skipping progress output, no original writer: {output}");
            return;
        };

        // Keep progress lines and bridged logs from tearing each other
        Logger::multi_progress().suspend(|| {
            if let Err(e) = original.text(output) {
                log::error!("Failed to render progress: {e}");
            }
        });
    }
}

impl Plugin for DeployProgress {
    fn name(&self) -> &'static str {
        "deploy-progress"
    }

    fn on_event(&self, event: &Event) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        let output = match event {
            Event::Started { command } => {
                state.started_at = Some(Instant::now());
                state.command = Some(command.to_string());

                format!(
                    "\n{} {}\n",
                    console::style(with_padding("Deploying")).green().bold(),
                    self.service_name,
                )
            }

            Event::Output(line) => {
                let line = line.trim();

                if line.is_empty() {
                    return;
                }

                state.lines.push(line.to_string());

                if state.lines.len() > TAIL_LENGTH {
                    state.lines.remove(0);
                }

                // Transient one-line status, only makes sense in a terminal
                if !self.is_terminal {
                    return;
                }

                state.has_transient_line = true;

                // Trim the line to 48 characters with ellipsis if necessary
                let line_trimmed = if line.chars().count() > 48 {
                    format!("{}...", line.chars().take(45).collect::<String>())
                } else {
                    line.to_string()
                };

                format!("\r\x1B[K{}", console::style(line_trimmed).dim())
            }

            Event::Finished { command } => {
                let clear = if state.has_transient_line { "\r\x1B[K" } else { "" };
                state.has_transient_line = false;

                format!(
                    "{clear}{} `{}` {command}{}\n",
                    console::style(with_padding("Finished")).green().bold(),
                    self.service_name,
                    elapsed(&state),
                )
            }
        };

        drop(state);
        self.write(&output);
    }
}

fn elapsed(state: &State) -> String {
    state
        .started_at
        .map(|started_at| format!(" in {:.2}s", started_at.elapsed().as_secs_f64()))
        .unwrap_or_default()
}

// Required padding to make the message centered in the cargo-like style
fn with_padding(message: &str) -> String {
    let padding = " ".repeat(12usize.saturating_sub(message.len()));
    format!("{}{}", padding, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{buffer, contents};

    fn progress(is_terminal: bool) -> (DeployProgress, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
        let (writer, output, _) = buffer();
        let interception = writer.intercept().unwrap();
        let progress = DeployProgress::new("api", is_terminal);
        progress.set_original_writer(interception.original());
        (progress, output)
    }

    #[test]
    fn renders_stages_through_the_original_writer() {
        let (progress, output) = progress(false);
        progress.on_event(&Event::Started { command: "deploy" });
        progress.on_event(&Event::Output("Packaging service..."));
        progress.on_event(&Event::Finished { command: "deploy" });

        let output = console::strip_ansi_codes(&contents(&output)).to_string();
        assert!(output.starts_with("\n   Deploying api\n"));
        assert!(output.contains("    Finished `api` deploy in "));
        assert!(!output.contains("Packaging"));
    }

    #[test]
    fn shows_trimmed_transient_line_in_terminal() {
        let (progress, output) = progress(true);
        progress.on_event(&Event::Output(&"x".repeat(60)));

        let output = contents(&output);
        assert!(output.starts_with("\r\x1B[K"));
        let output = console::strip_ansi_codes(&output).to_string();
        assert_eq!(output, format!("\r{}...", "x".repeat(45)));
    }

    #[test]
    fn error_reports_collected_output() {
        let (progress, output) = progress(false);
        progress.on_event(&Event::Started { command: "deploy" });
        progress.on_event(&Event::Output("Error: stack is in UPDATE_ROLLBACK_FAILED"));
        progress.handle_error();

        let output = console::strip_ansi_codes(&contents(&output)).to_string();
        assert!(output.contains("       Error `api` deploy failed in "));
        assert!(output.ends_with("\nError: stack is in UPDATE_ROLLBACK_FAILED\n"));
    }

    #[test]
    fn keeps_only_the_tail() {
        let (progress, _) = progress(false);

        for i in 0..30 {
            progress.on_event(&Event::Output(&format!("line {i}")));
        }

        let state = progress.state.lock().unwrap();
        assert_eq!(state.lines.len(), TAIL_LENGTH);
        assert_eq!(state.lines[0], "line 10");
    }

    #[test]
    fn skips_output_without_original_writer() {
        let progress = DeployProgress::new("api", false);
        progress.on_event(&Event::Started { command: "deploy" });
        progress.handle_error();
    }
}
