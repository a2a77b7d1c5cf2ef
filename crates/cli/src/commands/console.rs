//! Console command handler.
//!
//! A line-oriented version of the browser page: the session, and with it the
//! last asked question, lives for the whole console run.

use anyhow::Context;
use clap::Args;
use helpdesk_client::Session;
use helpdesk_core::{config::AppConfig, AppError, AppResult};
use std::io::{BufRead, Write};

use super::client::{connect, format_notice};

const HELP: &str = "\
Commands:
  files                      list indexed files
  ask <question>             ask a question
  feedback <file> [question] record the answer file (question defaults to the last one)
  metrics [k]                show hit@k, MRR, nDCG@k
  reindex                    rebuild the index
  help                       show this help
  quit                       leave the console";

/// Interactive client session
#[derive(Args, Debug)]
pub struct ConsoleCommand {
    /// Contexts retrieved per question
    #[arg(long, default_value = "3")]
    pub ask_k: u32,

    /// Depth used when recording feedback
    #[arg(long, default_value = "5")]
    pub feedback_k: u32,
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Files,
    Ask(String),
    Feedback { file: String, question: String },
    Metrics(Option<u32>),
    Reindex,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Line {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (word, rest) = match raw.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (raw, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Line::Empty,
            "files" => Line::Files,
            "ask" => Line::Ask(rest.to_string()),
            "feedback" if !rest.is_empty() => {
                let (file, question) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Line::Feedback {
                    file: file.to_string(),
                    question: question.trim().to_string(),
                }
            }
            "metrics" => match rest {
                "" => Line::Metrics(None),
                k => k.parse().map(|k| Line::Metrics(Some(k))).unwrap_or_else(|_| Line::Unknown(raw.to_string())),
            },
            "reindex" => Line::Reindex,
            "help" | "?" => Line::Help,
            "quit" | "exit" | "done" => Line::Quit,
            _ => Line::Unknown(raw.to_string()),
        }
    }
}

impl ConsoleCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing console command against {}", config.server_url);

        let session = connect(config)?;
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        self.run(&session, stdin.lock(), &mut stdout)
            .await
            .map_err(|e| AppError::Other(format!("{:#}", e)))
    }

    /// Read commands until `quit` or end of input.
    ///
    /// Request failures are printed and the loop continues.
    pub async fn run<R: BufRead, W: Write>(
        &self,
        session: &Session,
        mut input: R,
        output: &mut W,
    ) -> anyhow::Result<()> {
        writeln!(output, "Connected to {}. Type 'help' for commands.", session.client().base_url())?;

        loop {
            write!(output, "helpdesk> ")?;
            output.flush()?;

            let mut raw = String::new();
            if input.read_line(&mut raw).context("Failed to read input")? == 0 {
                break;
            }

            let result = match Line::parse(&raw) {
                Line::Empty => continue,
                Line::Quit => break,
                Line::Help => Ok(HELP.to_string()),
                Line::Unknown(line) => Ok(format!("Unknown command: {} (try 'help')", line)),
                Line::Files => session
                    .refresh_files()
                    .await
                    .map(|view| format!("{}\n{} files", view.text, view.count())),
                Line::Ask(question) => session.ask(&question, self.ask_k).await,
                Line::Feedback { file, question } => {
                    session.submit_feedback(&question, &file, self.feedback_k).await
                }
                Line::Metrics(k) => session.metrics(k.unwrap_or(self.feedback_k)).await,
                Line::Reindex => session.reindex().await.map(|view| view.text),
            };

            match result {
                Ok(text) => writeln!(output, "{}", text)?,
                Err(e) => writeln!(output, "Error: {}", e)?,
            }
            for notice in session.take_notices().await {
                writeln!(output, "{}", format_notice(&notice))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_client::HelpdeskClient;
    use std::io::Cursor;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Line::parse("files"), Line::Files);
        assert_eq!(Line::parse("  ASK  how do I print? "), Line::Ask("how do I print?".to_string()));
        assert_eq!(
            Line::parse("feedback printer.txt paper jam"),
            Line::Feedback {
                file: "printer.txt".to_string(),
                question: "paper jam".to_string()
            }
        );
        assert_eq!(
            Line::parse("feedback vpn.txt"),
            Line::Feedback {
                file: "vpn.txt".to_string(),
                question: String::new()
            }
        );
        assert_eq!(Line::parse("metrics"), Line::Metrics(None));
        assert_eq!(Line::parse("metrics 3"), Line::Metrics(Some(3)));
        assert_eq!(Line::parse("reindex"), Line::Reindex);
        assert_eq!(Line::parse("exit"), Line::Quit);
        assert_eq!(Line::parse(""), Line::Empty);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Line::parse("feedback"), Line::Unknown("feedback".to_string()));
        assert_eq!(Line::parse("metrics many"), Line::Unknown("metrics many".to_string()));
        assert_eq!(Line::parse("print"), Line::Unknown("print".to_string()));
    }

    #[tokio::test]
    async fn test_console_reports_transport_errors_and_continues() {
        let session = Session::new(HelpdeskClient::new("http://127.0.0.1:9").unwrap());
        let command = ConsoleCommand { ask_k: 3, feedback_k: 5 };

        let mut output = Vec::new();
        command
            .run(&session, Cursor::new("files\nhelp\nquit\nfiles\n"), &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Error: HTTP error").count(), 1);
        assert!(text.contains("Commands:"));
    }
}
