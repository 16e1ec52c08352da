//! Result rendering: turn an [`AdvisorState`] into something a user sees.
//!
//! The pipeline core never prints. Each shell picks a renderer:
//!
//! * [`TerminalRenderer`]: stdout/stderr text for the CLI
//! * `HtmlRenderer` (feature `web`): the upload page for the web form
//!
//! Tests render with either and inspect the output directly.

use crate::advise::AdvisorState;
use crate::error::AdviceFailure;

/// Renders one advisor state into an output type chosen by the shell.
pub trait Render {
    type Output;

    fn render(&self, state: &AdvisorState) -> Self::Output;
}

/// One-line description of a failure that always carries the status code
/// (when there is one) and the detail text.
pub fn failure_message(failure: &AdviceFailure) -> String {
    match failure {
        AdviceFailure::Remote { status, detail } => {
            format!("Error generating advice (HTTP {status}): {detail}")
        }
        AdviceFailure::Transport { detail } => {
            format!("Error generating advice: could not reach the service: {detail}")
        }
        AdviceFailure::MalformedResponse { detail } => {
            format!("Error generating advice: unexpected response from the service: {detail}")
        }
    }
}

// ── Terminal ─────────────────────────────────────────────────────────────

/// What the CLI should write and how it should exit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalOutput {
    pub stdout: String,
    pub stderr: String,
    /// `false` maps to a non-zero exit status.
    pub success: bool,
}

/// Plain-text renderer for the command-line variant.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    /// Write the advice to stdout. Disable when it was already streamed.
    pub echo_advice: bool,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self { echo_advice: true }
    }
}

impl Render for TerminalRenderer {
    type Output = TerminalOutput;

    fn render(&self, state: &AdvisorState) -> TerminalOutput {
        match state {
            AdvisorState::AwaitingInputs { notice } => TerminalOutput {
                stdout: String::new(),
                stderr: notice.clone().unwrap_or_default(),
                success: false,
            },
            AdvisorState::Processing {
                progress_name,
                schedule_name,
            } => TerminalOutput {
                stdout: String::new(),
                stderr: format!("Analyzing {progress_name} and {schedule_name}…"),
                success: true,
            },
            AdvisorState::Displayed { text } => {
                let mut stdout = if self.echo_advice { text.clone() } else { String::new() };
                if self.echo_advice && !stdout.ends_with('\n') {
                    stdout.push('\n');
                }
                TerminalOutput {
                    stdout,
                    stderr: String::new(),
                    success: true,
                }
            }
            AdvisorState::ErrorDisplayed { failure } => TerminalOutput {
                stdout: String::new(),
                stderr: failure_message(failure),
                success: false,
            },
        }
    }
}

// ── HTML ─────────────────────────────────────────────────────────────────

#[cfg(feature = "web")]
pub use html::HtmlRenderer;

#[cfg(feature = "web")]
mod html {
    use super::{failure_message, Render};
    use crate::advise::AdvisorState;
    use minijinja::{context, Environment};

    const PAGE: &str = "page.html";

    const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>AdviseMe</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 56rem; margin: 2rem auto; padding: 0 1rem; }
    .cols { display: flex; gap: 2rem; }
    .cols > div { flex: 1; }
    .notice { background: #fff4ce; padding: .75rem 1rem; border-radius: .4rem; }
    .error { background: #fde7e9; padding: .75rem 1rem; border-radius: .4rem; }
    .success { background: #dff6dd; padding: .75rem 1rem; border-radius: .4rem; }
    textarea { width: 100%; height: 25rem; }
    footer { margin-top: 2rem; color: #666; font-style: italic; }
  </style>
</head>
<body>
  <h1>🎓 AdviseMe</h1>
  <h2>Academic Advisor Assistant</h2>
  <form method="post" action="/advise" enctype="multipart/form-data">
    <div class="cols">
      <div>
        <p><strong>Student Academic Progress</strong></p>
        <label>Upload academic progress PDF
          <input type="file" name="progress" accept="application/pdf,.pdf">
        </label>
      </div>
      <div>
        <p><strong>Course Schedule</strong></p>
        <label>Upload course schedule PDF
          <input type="file" name="schedule" accept="application/pdf,.pdf">
        </label>
      </div>
    </div>
    <p><button type="submit">Generate Academic Advice</button></p>
  </form>
  {% if notice %}<p class="notice" role="status">{{ notice }}</p>{% endif %}
  {% if error %}
  <div class="error" role="alert">
    <p>{{ error.message }}</p>
    {% if error.status %}<p>Status code: <code>{{ error.status }}</code></p>{% endif %}
    <pre>{{ error.detail }}</pre>
  </div>
  {% endif %}
  {% if advice %}
  <p class="success">Analysis complete!</p>
  <h3>Academic Advice Email</h3>
  <label>Generated Email<br><textarea readonly>{{ advice }}</textarea></label>
  {% endif %}
  <hr>
  <footer>AdviseMe - AI-powered academic advising assistant</footer>
</body>
</html>
"#;

    /// Renders the upload page with the outcome of the last action.
    ///
    /// The template is registered under an `.html` name so minijinja escapes
    /// every interpolated value.
    pub struct HtmlRenderer {
        env: Environment<'static>,
    }

    impl std::fmt::Debug for HtmlRenderer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("HtmlRenderer").finish_non_exhaustive()
        }
    }

    impl HtmlRenderer {
        pub fn new() -> Result<Self, minijinja::Error> {
            let mut env = Environment::new();
            env.add_template(PAGE, PAGE_TEMPLATE)?;
            Ok(Self { env })
        }
    }

    impl Render for HtmlRenderer {
        type Output = Result<String, minijinja::Error>;

        fn render(&self, state: &AdvisorState) -> Self::Output {
            let tmpl = self.env.get_template(PAGE)?;
            match state {
                AdvisorState::AwaitingInputs { notice } => tmpl.render(context! { notice }),
                AdvisorState::Processing { .. } => tmpl.render(context! {
                    notice => "Analyzing documents and generating advice...",
                }),
                AdvisorState::Displayed { text } => tmpl.render(context! { advice => text }),
                AdvisorState::ErrorDisplayed { failure } => tmpl.render(context! {
                    error => context! {
                        message => failure_message(failure),
                        status => failure.status_code(),
                        detail => failure.detail(),
                    },
                }),
            }
        }
    }
}
