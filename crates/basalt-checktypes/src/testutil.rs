//! In-memory container engine for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use basalt_containers::ContainerEngine;
use basalt_core::Result;

/// Engine double that stores labels per image reference and counts builds.
#[derive(Default)]
pub struct FakeEngine {
    labels: Mutex<HashMap<String, HashMap<String, String>>>,
    builds: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> FakeEngine {
        FakeEngine::default()
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn set_labels(&self, image: &str, labels: HashMap<String, String>) {
        self.labels.lock().unwrap().insert(image.to_string(), labels);
    }

    pub fn labels_of(&self, image: &str) -> HashMap<String, String> {
        self.labels
            .lock()
            .unwrap()
            .get(image)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn image_labels(&self, image: &str) -> Result<HashMap<String, String>> {
        Ok(self.labels_of(image))
    }

    async fn build_image(
        &self,
        tags: &[String],
        labels: &HashMap<String, String>,
        context: Vec<u8>,
    ) -> Result<String> {
        assert!(!context.is_empty(), "build context must not be empty");
        self.builds.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.labels.lock().unwrap();
        for tag in tags {
            stored.insert(tag.clone(), labels.clone());
        }
        Ok(format!("built {}", tags.join(", ")))
    }
}
