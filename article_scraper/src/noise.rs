use crate::ContentBlock;

pub const DEFAULT_NOISE_KEYWORDS: &[&str] = &[
    "next post",
    "previous post",
    "menu",
    "search",
    "skip to content",
];

/// Keyword heuristic for menus, pagination and similar page chrome that the
/// permissive body rules pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseFilter {
    keywords: Vec<String>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_KEYWORDS.iter().copied())
    }
}

impl NoiseFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_navigational(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Drops flagged blocks whole; the rest keep their order.
    pub fn filter(&self, blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
        let before = blocks.len();
        let kept: Vec<_> = blocks
            .into_iter()
            .filter(|b| !self.is_navigational(&b.text))
            .collect();
        if kept.len() < before {
            tracing::debug!(dropped = before - kept.len(), "dropped navigational blocks");
        }
        kept
    }
}
