//! Eval command handler.
//!
//! Interactive retrieval evaluation: the user types a question and the file
//! that should answer it, and gets the rank plus running metrics.

use anyhow::Context;
use clap::Args;
use helpdesk_core::{config::AppConfig, AppError, AppResult};
use helpdesk_knowledge::metrics::{hit_at_k, mrr, ndcg_at_k};
use helpdesk_knowledge::{FeedbackLog, FeedbackRecord, MetricsSummary, Retriever};
use std::io::{BufRead, Write};

/// Interactive retrieval evaluation
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// Number of results to search per question
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: u32,

    /// Do not append answers to the feedback log
    #[arg(long)]
    pub no_persist: bool,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command with k={}", self.top_k);

        if self.top_k == 0 {
            return Err(AppError::InvalidRequest("k must be at least 1".to_string()));
        }

        config.validate()?;
        config.ensure_data_dirs()?;

        let retriever = helpdesk_knowledge::load_retriever(config).await?;
        let log = FeedbackLog::new(config.feedback_path());
        let persist = (!self.no_persist).then_some(&log);

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let summary = run_eval(&retriever, persist, self.top_k, stdin.lock(), &mut stdout)
            .await
            .map_err(|e| AppError::Other(format!("{:#}", e)))?;

        tracing::debug!("Eval finished after {} questions", summary.count);
        Ok(())
    }
}

/// Drive one evaluation session over `input`, writing prompts and results to
/// `output`. Ends on `done`, an empty question, or end of input.
pub async fn run_eval<R: BufRead, W: Write>(
    retriever: &Retriever,
    log: Option<&FeedbackLog>,
    k: u32,
    mut input: R,
    output: &mut W,
) -> anyhow::Result<MetricsSummary> {
    let files = retriever.files();

    writeln!(output, "\nInteractive Retrieval Eval")?;
    writeln!(output, "--------------------------")?;
    writeln!(output, "Available files ({}): {}", files.len(), files.join(", "))?;
    writeln!(output, "Type 'done' to finish.\n")?;

    let mut ranks: Vec<Option<u32>> = Vec::new();
    loop {
        let question = match prompt(&mut input, output, "Question: ")? {
            Some(q) if !q.is_empty() && !q.eq_ignore_ascii_case("done") => q,
            _ => break,
        };

        let Some(answer) = prompt(&mut input, output, "Correct filename (exact match from list above): ")? else {
            break;
        };
        if !files.iter().any(|f| *f == answer) {
            writeln!(output, "  ! Not in indexed files. Try again.")?;
            continue;
        }

        let rank = retriever.rank_of(&question, &answer, k as usize).await?;
        ranks.push(rank);

        match rank {
            Some(rank) => writeln!(output, "  → Rank: {}", rank)?,
            None => writeln!(output, "  → Rank: NOT FOUND in top-{}", k)?,
        }
        writeln!(
            output,
            "  Stats so far | hit@{k}: {:.3} | MRR: {:.3} | nDCG@{k}: {:.3}\n",
            hit_at_k(&ranks, k),
            mrr(&ranks),
            ndcg_at_k(&ranks, k),
        )?;

        if let Some(log) = log {
            log.append(&FeedbackRecord::new(question, answer, k, rank))
                .with_context(|| format!("Failed to append to {}", log.path().display()))?;
        }
    }

    let summary = MetricsSummary::compute(&ranks, k);
    writeln!(output, "\nFinal metrics")?;
    writeln!(output, "  Queries: {}", summary.count)?;
    writeln!(output, "  hit@{}: {:.3}", k, summary.hit_at_k)?;
    writeln!(output, "  MRR: {:.3}", summary.mrr)?;
    writeln!(output, "  nDCG@{}: {:.3}", k, summary.ndcg_at_k)?;

    Ok(summary)
}

/// Print `label`, read one trimmed line; `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> anyhow::Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
