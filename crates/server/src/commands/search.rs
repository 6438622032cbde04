//! Search command: probe the knowledge base without calling the model.

use crate::state::{build_embedder, build_retriever};
use clap::Args;
use sage_core::{config::AppConfig, AppError, AppResult};
use sage_knowledge::{label_for, RetrievedDocument, SearchParams};

const PREVIEW_CHARS: usize = 100;

/// Search the knowledge base and list matching passages
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Text to search for
    pub query: String,

    /// Maximum number of passages (default: configured top-k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Minimum similarity (default: configured threshold)
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Only search passages stored with this similarity metric
    #[arg(long)]
    pub metric: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let embedder = build_embedder(config)?;
        let retriever = build_retriever(config)?;

        let vector = embedder.embed(&self.query).await?;
        let params = SearchParams::new(
            self.top_k.unwrap_or(config.vector.top_k),
            self.threshold.unwrap_or(config.vector.similarity_threshold),
            config.vector.namespace.clone(),
        )
        .with_similarity_metric(self.metric.as_deref());

        let docs = retriever.search(vector, &params).await?;

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "namespace": params.namespace,
                "results": docs,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        if docs.is_empty() {
            println!("No passages found above {:.2}", params.threshold);
            return Ok(());
        }

        println!("Found {} passages:\n", docs.len());
        for (idx, doc) in docs.iter().enumerate() {
            println!("{}", format_hit(doc, idx));
        }

        Ok(())
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        format!("{}...", flat.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        flat
    }
}

fn format_hit(doc: &RetrievedDocument, idx: usize) -> String {
    let score = doc
        .score
        .map(|s| format!("{:.3}", s))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "{}. {} (score: {})\n   {}\n",
        idx + 1,
        label_for(doc, idx),
        score,
        preview(&doc.text)
    )
}
