use std::sync::Arc;

use tracing::debug;

use crate::compile::{CompiledFormSchema, compile};
use crate::spec::question::QuestionDefinition;

/// Caches the compiled schema for the last seen question list.
///
/// The cache is keyed on the identity of the shared list, not on its
/// contents: handing in a freshly allocated but equal list recompiles.
#[derive(Debug, Default)]
pub struct SchemaCache {
    source: Option<Arc<Vec<QuestionDefinition>>>,
    compiled: Option<Arc<CompiledFormSchema>>,
    compilations: usize,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(
        &mut self,
        questions: &Arc<Vec<QuestionDefinition>>,
    ) -> Arc<CompiledFormSchema> {
        if let (Some(source), Some(compiled)) = (&self.source, &self.compiled)
            && Arc::ptr_eq(source, questions)
        {
            return Arc::clone(compiled);
        }

        let compiled = Arc::new(compile(questions));
        self.compilations += 1;
        debug!(compilations = self.compilations, "question list changed, recompiled");
        self.source = Some(Arc::clone(questions));
        self.compiled = Some(Arc::clone(&compiled));
        compiled
    }

    /// Number of compilations performed so far.
    pub fn compilations(&self) -> usize {
        self.compilations
    }

    pub fn invalidate(&mut self) {
        self.source = None;
        self.compiled = None;
    }
}
