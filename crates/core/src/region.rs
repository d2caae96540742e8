use crate::traits::ContentRegion;
use parking_lot::Mutex;

/// Keeps the current fragment and every write made to it.
#[derive(Debug, Default)]
pub struct MemoryRegion {
    writes: Mutex<Vec<String>>,
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.writes.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

impl ContentRegion for MemoryRegion {
    fn replace(&self, html: &str) {
        self.writes.lock().push(html.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryRegion;
    use crate::traits::ContentRegion;

    #[test]
    fn latest_write_wins() {
        let region = MemoryRegion::new();
        assert!(region.current().is_none());

        region.replace("<i>buscando</i>");
        region.replace("<h2>listo</h2>");

        assert_eq!(region.current().as_deref(), Some("<h2>listo</h2>"));
        assert_eq!(region.write_count(), 2);
        assert_eq!(region.history()[0], "<i>buscando</i>");
    }
}
