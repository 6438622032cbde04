//! Ask command: answer one question from the command line.

use crate::state::build_pipeline;
use clap::Args;
use sage_core::{config::AppConfig, AppError, AppResult};
use sage_knowledge::{parse_packaged, ChatTurn, RagOutcome};
use sage_llm::ChatRole;
use sage_prompt::HistoryMessage;
use tokio::sync::watch;

/// Answer a single question from the knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Answer without retrieval (no context, no sources)
    #[arg(long)]
    pub no_rag: bool,

    /// Only search passages stored with this similarity metric
    #[arg(long)]
    pub metric: Option<String>,

    /// Print the answer and its sources separately instead of the packaged text
    #[arg(long)]
    pub split: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        config.validate()?;
        let pipeline = build_pipeline(config)?;

        let turn = ChatTurn {
            messages: vec![HistoryMessage::new(ChatRole::User, self.question.clone())],
            use_rag: !self.no_rag,
            model: None,
            similarity_metric: self.metric.clone(),
        };

        // Ctrl-C aborts the in-flight completion
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send(true);
            }
        });

        let result = pipeline.run(&turn, Some(cancel_rx)).await;
        watcher.abort();

        match result.map_err(AppError::from)? {
            RagOutcome::NoRelevantContext(apology) => println!("{}", apology),
            RagOutcome::Answered(body) if !self.split => println!("{}", body),
            RagOutcome::Answered(body) => {
                let answer = parse_packaged(&body);
                println!("{}", answer.text);
                if !answer.sources.is_empty() {
                    println!("\nSources:");
                    for source in &answer.sources {
                        println!("  - {}", source);
                    }
                }
            }
        }

        Ok(())
    }
}
