//! Per-process registry handing out the single pipeline instance for a given
//! `streamId` (§5: "per-stream pipeline... created lazily and guarded
//! against double-initialisation").

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use substrate_core::TenantContext;

use crate::config::StreamPipelineConfig;
use crate::knowledge_store::KnowledgeStore;
use crate::pipeline::StreamingPipeline;

/// Owns every live [`StreamingPipeline`] for one knowledge-store backend.
/// Cloning is cheap (the map lives behind an `Arc`); every clone observes the
/// same set of pipelines.
pub struct StreamPipelineRegistry<KS> {
    store: Arc<KS>,
    config: StreamPipelineConfig,
    pipelines: Mutex<HashMap<String, Arc<StreamingPipeline<Arc<KS>>>>>,
}

impl<KS> StreamPipelineRegistry<KS>
where
    KS: KnowledgeStore + Send + Sync + 'static,
{
    pub fn new(store: KS, config: StreamPipelineConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pipeline for `stream_id`, creating it on first use. A
    /// second call with the same id and a different tenant/domain still
    /// returns the original pipeline — the first caller's scoping wins,
    /// matching "single pipeline per streamId" rather than per-call
    /// parameters.
    pub fn get_or_create(
        &self,
        stream_id: &str,
        domain: &str,
        tenant: Option<TenantContext>,
    ) -> Arc<StreamingPipeline<Arc<KS>>> {
        let mut pipelines = self.pipelines.lock().unwrap();
        if let Some(existing) = pipelines.get(stream_id) {
            return Arc::clone(existing);
        }
        let pipeline = StreamingPipeline::new(
            stream_id.to_string(),
            domain.to_string(),
            tenant,
            self.config.clone(),
            Arc::clone(&self.store),
        );
        pipelines.insert(stream_id.to_string(), Arc::clone(&pipeline));
        pipeline
    }

    pub fn get(&self, stream_id: &str) -> Option<Arc<StreamingPipeline<Arc<KS>>>> {
        self.pipelines.lock().unwrap().get(stream_id).cloned()
    }

    /// Closes and drops a pipeline from the registry (after `close()` has
    /// been called on it, or as part of closing it now).
    pub async fn remove(&self, stream_id: &str) {
        let pipeline = self.pipelines.lock().unwrap().remove(stream_id);
        if let Some(pipeline) = pipeline {
            pipeline.close().await;
        }
    }
}
