//! Pipeline wiring.
//!
//! [`Pipeline`] owns every injected collaborator and store and is shared
//! by the CLI and the HTTP server. The stage logic lives in
//! [`analyze`](crate::analyze) and [`generate`](crate::generate); this
//! module only assembles the pieces.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use reforge_core::cache::GenerationCache;
use reforge_core::traits::{Analyzer, Architect, ProjectBuilder, Refiner, Summarizer};

use crate::analysis_store::AnalysisStore;
use crate::builder::CommandBuilder;
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::llm::{ChatClient, GeneratorRegistry, LlmAnalyzer, LlmArchitect, LlmRefiner, LlmSummarizer};
use crate::retrieval::RetrievalService;
use crate::vector_store::VectorStore;
use crate::db;

/// Knobs the stages read at run time, extracted from [`Config`].
pub struct PipelineSettings {
    pub summarize_threshold_chars: usize,
    pub max_refine_attempts: u32,
    pub skip_validation: bool,
    pub connection_string: Option<String>,
    pub exports_dir: PathBuf,
}

pub struct Pipeline {
    pub analyzer: Box<dyn Analyzer>,
    pub summarizer: Box<dyn Summarizer>,
    pub architect: Box<dyn Architect>,
    pub generators: GeneratorRegistry,
    pub builder: Option<Box<dyn ProjectBuilder>>,
    pub refiner: Box<dyn Refiner>,
    pub analysis_store: AnalysisStore,
    pub vector_store: Arc<VectorStore>,
    pub retrieval: RetrievalService,
    pub cache: Mutex<GenerationCache>,
    pub settings: PipelineSettings,
}

impl Pipeline {
    /// Assemble the production pipeline from configuration: SQLite
    /// analysis store, file-backed vector store, OpenAI-compatible
    /// embedder, and LLM collaborators sharing one chat client.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(&config.storage.db_path()).await?;
        db::run_migrations(&pool).await?;
        let analysis_store = AnalysisStore::new(pool);

        let embedder: Arc<dyn reforge_core::traits::Embedder> =
            Arc::from(create_embedder(&config.embedding)?);
        let vector_store = Arc::new(VectorStore::open(&config.storage.data_dir, embedder)?);
        let retrieval = RetrievalService::new(vector_store.clone(), config.retrieval.top_k);

        let chat = Arc::new(ChatClient::new(&config.llm)?);

        let builder: Option<Box<dyn ProjectBuilder>> = config
            .builder
            .command
            .as_ref()
            .map(|cmd| Box::new(CommandBuilder::new(cmd.clone())) as Box<dyn ProjectBuilder>);

        Ok(Self {
            analyzer: Box::new(LlmAnalyzer::new(chat.clone())),
            summarizer: Box::new(LlmSummarizer::new(chat.clone())),
            architect: Box::new(LlmArchitect::new(chat.clone())),
            generators: GeneratorRegistry::with_llm(chat.clone()),
            builder,
            refiner: Box::new(LlmRefiner::new(chat)),
            analysis_store,
            vector_store,
            retrieval,
            cache: Mutex::new(GenerationCache::new(config.generation.cache_capacity)),
            settings: PipelineSettings {
                summarize_threshold_chars: config.analyzer.summarize_threshold_chars,
                max_refine_attempts: config.generation.max_refine_attempts,
                skip_validation: config.generation.skip_validation,
                connection_string: config.generation.connection_string.clone(),
                exports_dir: config.storage.exports_dir(),
            },
        })
    }
}
