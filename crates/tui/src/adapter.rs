use std::sync::{
    Arc, RwLock,
    atomic::{AtomicU64, Ordering},
};

use utils::line_store::LineStore;

/// Presentation adapter between reconciliation workers and the log view.
///
/// Selecting a node installs a fresh line store (the synchronous buffer
/// clear) and bumps the generation. Writers carry the generation they were
/// started with and it is checked at write time, so a superseded
/// reconciliation can run to completion without its output ever reaching
/// the now-stale view.
pub struct LogPane {
    store: RwLock<Arc<LineStore>>,
    generation: AtomicU64,
}

impl Default for LogPane {
    fn default() -> Self {
        Self::new()
    }
}

impl LogPane {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Arc::new(LineStore::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Begin a new selection: clear the view, invalidate older writers, and
    /// hand the caller its write token and the fresh buffer.
    pub fn select(&self) -> (u64, Arc<LineStore>) {
        // The write lock makes bump-and-swap atomic relative to writers.
        let mut slot = self.store.write().unwrap();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let store = Arc::new(LineStore::new());
        *slot = store.clone();
        (generation, store)
    }

    pub fn on_line(&self, generation: u64, text: String) -> bool {
        self.write(generation, |store| store.push_line(text))
    }

    pub fn on_notice(&self, generation: u64, text: String) -> bool {
        self.write(generation, |store| store.push_notice(text))
    }

    pub fn finish(&self, generation: u64) -> bool {
        self.write(generation, |store| store.push_finished())
    }

    fn write<F: FnOnce(&LineStore)>(&self, generation: u64, f: F) -> bool {
        let slot = self.store.read().unwrap();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        f(&slot);
        true
    }

    /// Renderable snapshot of the current buffer.
    pub fn lines(&self) -> Vec<String> {
        self.store.read().unwrap().lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_with_current_generation_are_visible() {
        let pane = LogPane::new();
        let (generation, _store) = pane.select();

        assert!(pane.on_line(generation, "hello\n".into()));
        assert_eq!(pane.lines(), vec!["hello\n"]);
    }

    #[test]
    fn superseded_writer_output_is_discarded() {
        let pane = LogPane::new();
        let (old_generation, _old_store) = pane.select();
        pane.on_line(old_generation, "old\n".into());

        let (new_generation, _new_store) = pane.select();

        // The old reconciliation keeps running; its output must not appear.
        assert!(!pane.on_line(old_generation, "stale\n".into()));
        assert!(!pane.finish(old_generation));

        assert!(pane.on_line(new_generation, "new\n".into()));
        assert_eq!(pane.lines(), vec!["new\n"]);
    }

    #[test]
    fn select_clears_the_visible_buffer() {
        let pane = LogPane::new();
        let (generation, _store) = pane.select();
        pane.on_line(generation, "content\n".into());

        pane.select();
        assert!(pane.lines().is_empty());
    }
}
