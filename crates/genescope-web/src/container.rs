//! Page containers the controller writes fragments into.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use genescope_common::config::PageConfig;

/// A page region addressed by a stable id whose markup can be replaced.
pub trait Container: Send + Sync {
    fn id(&self) -> &str;

    /// Replace the container's markup.
    fn set_html(&self, html: String);

    fn html(&self) -> String;
}

pub type ContainerHandle = Arc<dyn Container>;

/// Container backed by an in-memory string.
#[derive(Debug)]
pub struct MemoryContainer {
    id: String,
    html: RwLock<String>,
    writes: AtomicUsize,
}

impl MemoryContainer {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            html: RwLock::new(String::new()),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn shared(id: &str) -> Arc<Self> {
        Arc::new(Self::new(id))
    }

    /// Number of times the markup has been replaced.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Container for MemoryContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_html(&self, html: String) {
        *self.html.write().unwrap_or_else(PoisonError::into_inner) = html;
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn html(&self) -> String {
        self.html.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// The three containers the page controller drives.
#[derive(Clone)]
pub struct PageContainers {
    pub volcano: ContainerHandle,
    pub boxplot: ContainerHandle,
    pub publications: ContainerHandle,
}

impl PageContainers {
    pub fn new(volcano: ContainerHandle, boxplot: ContainerHandle, publications: ContainerHandle) -> Self {
        Self { volcano, boxplot, publications }
    }

    /// In-memory containers named after the configured ids.
    pub fn in_memory(page: &PageConfig) -> (Self, [Arc<MemoryContainer>; 3]) {
        let volcano = MemoryContainer::shared(&page.volcano_container);
        let boxplot = MemoryContainer::shared(&page.boxplot_container);
        let publications = MemoryContainer::shared(&page.publications_container);
        let containers = Self::new(volcano.clone(), boxplot.clone(), publications.clone());
        (containers, [volcano, boxplot, publications])
    }

    pub fn all(&self) -> [&ContainerHandle; 3] {
        [&self.volcano, &self.boxplot, &self.publications]
    }
}
