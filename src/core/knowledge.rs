use std::sync::Arc;

/// Background text shared verbatim with every worker of a crew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSource {
    content: Arc<str>,
}

impl KnowledgeSource {
    pub fn text(content: impl AsRef<str>) -> Self {
        Self {
            content: Arc::from(content.as_ref()),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Join all non-empty sources into one block, or `None` if there is nothing to say.
pub(crate) fn render(sources: &[KnowledgeSource]) -> Option<String> {
    let parts: Vec<&str> = sources
        .iter()
        .map(|s| s.content().trim())
        .filter(|s| !s.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}
