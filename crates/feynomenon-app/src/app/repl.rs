use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::future::Future;
use std::sync::Arc;

use feynomenon_llm_api::LlmClient;
use feynomenon_logging::ConversationLogger;
use feynomenon_tutor::prompts;
use feynomenon_tutor::{Session, SessionId, TutorResult};

use crate::app::setup::AppConfig;

enum Input {
    Line(String),
    Interrupted,
}

/// Run one tutoring session on the console.
pub async fn run_repl_mode(config: &AppConfig, client: Arc<dyn LlmClient>) -> Result<()> {
    println!(
        "{}",
        "🤖 Welcome to Feynomenon AI - Your Feynman Technique Tutor!".bright_cyan().bold()
    );
    println!("{}", "=".repeat(60));

    if let Err(e) = run_session(config, client).await {
        eprintln!("\n{} An error occurred: {}", "❌".bright_red(), e);
        let hint = config
            .client_settings
            .backend
            .key_env_var()
            .unwrap_or("API URL");
        eprintln!("Please ensure your {} is correctly configured.", hint);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_session(config: &AppConfig, client: Arc<dyn LlmClient>) -> Result<()> {
    let session_id = SessionId::new_v4();
    let (session, greeting) = Session::create(session_id.clone(), client);
    let mut session = match &config.transcripts_dir {
        Some(dir) => {
            let logger = ConversationLogger::new(dir, session_id.as_str()).await?;
            println!("{} Transcript: {}", "📝".bright_blue(), logger.file_path().display());
            session.with_transcript(logger)
        }
        None => session,
    };

    let mut rl = DefaultEditor::new()?;

    println!(
        "\n{}",
        "--- Phase 1: Identifying Your Learning Topic ---".bright_yellow().bold()
    );
    print_ai(greeting);

    let result = converse(&mut session, &mut rl).await;
    session.close().await;
    result
}

async fn converse(session: &mut Session, rl: &mut DefaultEditor) -> Result<()> {
    loop {
        let line = match read_input(rl)? {
            Input::Line(line) => line,
            Input::Interrupted => return interrupted(),
        };

        if prompts::is_termination(&line) {
            print_ai(prompts::TOPIC_PHASE_FAREWELL);
            return Ok(());
        }

        let Some(outcome) = interruptible(session.submit_topic_message(&line)).await? else {
            return interrupted();
        };
        print_ai(outcome.response());

        if outcome.topic_identified() {
            break;
        }
    }

    let topic = session.chosen_topic().unwrap_or_default().to_string();
    println!(
        "\n{}",
        format!("--- Phase 2: Feynman Tutor for '{}' ---", topic).bright_yellow().bold()
    );

    let Some(explanation) = interruptible(session.start_tutoring()).await? else {
        return interrupted();
    };
    print_ai(&explanation);

    loop {
        let line = match read_input(rl)? {
            Input::Line(line) => line,
            Input::Interrupted => return interrupted(),
        };

        let Some(reply) = interruptible(session.submit_tutor_message(&line)).await? else {
            return interrupted();
        };
        print_ai(&reply.response);

        if reply.session_ended {
            return Ok(());
        }
    }
}

fn read_input(rl: &mut DefaultEditor) -> Result<Input> {
    loop {
        match rl.readline(&format!("{} ", "You:".bright_green().bold())) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                return Ok(Input::Line(line.to_string()));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(Input::Interrupted),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Await a model call unless Ctrl-C arrives first.
async fn interruptible<T>(call: impl Future<Output = TutorResult<T>>) -> Result<Option<T>> {
    tokio::select! {
        result = call => Ok(Some(result?)),
        _ = tokio::signal::ctrl_c() => Ok(None),
    }
}

fn interrupted() -> Result<()> {
    println!("\n\n{} {}", "AI:".bright_cyan().bold(), prompts::INTERRUPTED);
    Ok(())
}

fn print_ai(text: &str) {
    println!("{} {}", "AI:".bright_cyan().bold(), text);
}
