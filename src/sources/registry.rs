use crate::models::SourceConfig;

/// Configured feed sources, fixed at startup
///
/// Keeps every source in configuration order and, separately, the enabled
/// ones in ascending priority. Sources sharing a priority keep their
/// configuration order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
    by_priority: Vec<usize>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        let mut by_priority: Vec<usize> = sources
            .iter()
            .enumerate()
            .filter(|(_, source)| source.enabled)
            .map(|(index, _)| index)
            .collect();
        by_priority.sort_by_key(|&index| sources[index].priority);

        Self {
            sources,
            by_priority,
        }
    }

    /// All sources in configuration order, disabled ones included
    pub fn all(&self) -> &[SourceConfig] {
        &self.sources
    }

    /// Enabled sources in search order
    pub fn enabled_by_priority(&self) -> impl Iterator<Item = &SourceConfig> + '_ {
        self.by_priority.iter().map(move |&index| &self.sources[index])
    }

    pub fn get(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|source| source.id == id)
    }

    pub fn get_enabled(&self, id: &str) -> Option<&SourceConfig> {
        self.get(id).filter(|source| source.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.by_priority.len()
    }
}
