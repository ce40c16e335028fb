use console::style;
use std::io::Write;
use std::sync::Mutex;

const SUPPORT_EMAIL: &str = "hello@codecrafters.io";

/// User-facing messages for a test run.
///
/// Progress and verdicts go to `out`; failures go to `err` in red. Write
/// failures are ignored, the same as `println!` on a closed pipe would be.
pub struct TestRunUI {
    out: Mutex<Box<dyn Write + Send>>,
    err: Mutex<Box<dyn Write + Send>>,
}

impl TestRunUI {
    pub fn stdio() -> Self {
        Self::with_writers(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }

    pub fn with_writers(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    fn print(&self, lines: &[&str]) {
        if let Ok(mut out) = self.out.lock() {
            for line in lines {
                let _ = writeln!(out, "{}", line);
            }
            let _ = out.flush();
        }
    }

    fn print_red(&self, lines: &[&str]) {
        if let Ok(mut err) = self.err.lock() {
            for line in lines {
                if line.is_empty() {
                    let _ = writeln!(err);
                } else {
                    let _ = writeln!(err, "{}", style(line).red().for_stderr());
                }
            }
            let _ = err.flush();
        }
    }

    pub fn build_logs_starting(&self) {
        self.print(&[""]);
    }

    pub fn running_tests(&self) {
        self.print(&["", "Running tests. Logs should appear shortly...", ""]);
    }

    pub fn build_failed(&self) {
        let contact = format!(
            "If you think this is a CodeCrafters error, please let us know at {}.",
            SUPPORT_EMAIL
        );
        self.print_red(&["", "Looks like your codebase failed to build.", contact.as_str(), ""]);
    }

    /// A status poll gave up. `detail` is the rendered error chain.
    pub fn fetch_failed(&self, detail: &str) {
        let contact = format!("Let us know at {} if this error persists.", SUPPORT_EMAIL);
        self.print_red(&[
            detail,
            "",
            "We couldn't fetch the results of your test run. Please try again?",
            contact.as_str(),
        ]);
    }

    pub fn build_logs_failed(&self) {
        let contact = format!("Let us know at {} if this error persists.", SUPPORT_EMAIL);
        self.print_red(&[
            "",
            "We couldn't stream your build logs. Please try again?",
            contact.as_str(),
        ]);
    }

    pub fn build_status_unknown(&self) {
        let contact = format!("Let us know at {} if this error persists.", SUPPORT_EMAIL);
        self.print_red(&[
            "We couldn't fetch the results of your build. Please try again?",
            contact.as_str(),
        ]);
    }

    pub fn tests_passed(&self) {
        self.print(&["", "Tests passed!"]);
    }

    pub fn tests_failed(&self) {
        self.print(&["", "Tests failed"]);
    }

    pub fn no_verdict(&self) {
        self.print(&[""]);
    }
}

/// Print a top-level error in red on stderr. Empty messages print nothing.
pub fn print_error(message: &str) {
    if !message.is_empty() {
        eprintln!("{}", style(message).red().for_stderr());
    }
}

/// Guidance for a subcommand the CLI doesn't know.
pub fn print_unknown_command(command: &str) {
    println!(
        "{}",
        style(format!(
            "Unknown command '{}'. Did you mean to run `codecrafters test`?",
            command
        ))
        .red()
    );
    println!();
    println!("Run `codecrafters help` for a list of available commands.");
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Cloneable in-memory writer for asserting on UI output.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::SharedBuffer;
    use super::*;

    fn capture() -> (TestRunUI, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let ui = TestRunUI::with_writers(Box::new(out.clone()), Box::new(err.clone()));
        (ui, out, err)
    }

    #[test]
    fn test_verdicts_go_to_stdout() {
        let (ui, out, err) = capture();
        ui.tests_passed();
        ui.tests_failed();
        assert_eq!(out.contents(), "\nTests passed!\n\nTests failed\n");
        assert!(err.contents().is_empty());
    }

    #[test]
    fn test_running_tests_banner() {
        let (ui, out, _) = capture();
        ui.running_tests();
        assert_eq!(
            out.contents(),
            "\nRunning tests. Logs should appear shortly...\n\n"
        );
    }

    #[test]
    fn test_build_failure_goes_to_stderr_with_contact() {
        let (ui, out, err) = capture();
        ui.build_failed();
        assert!(out.contents().is_empty());
        let text = console::strip_ansi_codes(&err.contents()).into_owned();
        assert!(text.contains("Looks like your codebase failed to build."));
        assert!(text.contains(SUPPORT_EMAIL));
    }

    #[test]
    fn test_build_log_failure_suggests_retry() {
        let (ui, out, err) = capture();
        ui.build_logs_failed();
        assert!(out.contents().is_empty());
        let text = console::strip_ansi_codes(&err.contents()).into_owned();
        assert!(text.contains("We couldn't stream your build logs. Please try again?"));
        assert!(text.contains(SUPPORT_EMAIL));
    }

    #[test]
    fn test_fetch_failure_leads_with_detail() {
        let (ui, _, err) = capture();
        ui.fetch_failed("gave up after 5 attempts");
        let text = console::strip_ansi_codes(&err.contents()).into_owned();
        assert!(text.starts_with("gave up after 5 attempts\n\n"));
        assert!(text.contains("Please try again?"));
    }
}
