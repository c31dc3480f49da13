use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use crate::client::{Answerer, answer_text};
use crate::interaction_log::InteractionLog;

pub async fn run_repl(answerer: &dyn Answerer, log: &InteractionLog) -> Result<()> {
    run_repl_with(answerer, log, io::stdin().lock(), io::stdout()).await
}

fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit")
}

pub async fn run_repl_with<R, W>(
    answerer: &dyn Answerer,
    log: &InteractionLog,
    mut input: R,
    mut output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "🤖 Welcome to AI Q&A Bot!").context("Failed to write to stdout")?;
    writeln!(output, "Type your question below. Type 'exit' to quit.\n")
        .context("Failed to write to stdout")?;

    let mut asked = 0usize;
    loop {
        write!(output, "You: ").context("Failed to write to stdout")?;
        output.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read stdin")?;
        if read == 0 {
            writeln!(output).context("Failed to write to stdout")?;
            break;
        }

        let question = line.trim_end_matches(['\r', '\n']);
        if is_exit_command(question) {
            break;
        }

        let answer = answer_text(answerer.ask(question).await);
        writeln!(output, "AI: {}\n", answer).context("Failed to write to stdout")?;
        asked += 1;

        if let Err(err) = log.record(question, &answer) {
            warn!(
                path = %log.path().display(),
                error = %err,
                "failed to append interaction record"
            );
        }
    }

    info!(questions = asked, "interactive session finished");
    writeln!(output, "👋 Goodbye!").context("Failed to write to stdout")?;
    Ok(())
}
