use tracing::{debug, warn};

use crate::storage::{LocalStore, GALLERY_KEY};

#[derive(Debug)]
pub struct Gallery {
    store: LocalStore,
    images: Vec<String>,
}

impl Gallery {
    pub fn load(store: LocalStore) -> Self {
        let images = match store.get_item(GALLERY_KEY) {
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|err| {
                warn!("Failed to load gallery from {}: {}", store.path().display(), err);
                Vec::new()
            }),
            None => Vec::new(),
        };
        debug!("Loaded {} gallery image(s)", images.len());
        Gallery { store, images }
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.images.get(index).map(String::as_str)
    }

    pub fn save(&mut self, image: impl Into<String>) -> bool {
        let image = image.into();
        if self.images.contains(&image) {
            return false;
        }
        self.images.insert(0, image);
        self.persist();
        true
    }

    pub fn delete(&mut self, index: usize) -> Option<String> {
        if index >= self.images.len() {
            return None;
        }
        let removed = self.images.remove(index);
        self.persist();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.persist();
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.images)
            .map_err(anyhow::Error::from)
            .and_then(|encoded| self.store.set_item(GALLERY_KEY, &encoded));
        if let Err(err) = result {
            warn!("Failed to save gallery to {}: {}", self.store.path().display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(tag: &str) -> String {
        format!("data:image/png;base64,{tag}")
    }

    #[test]
    fn saving_twice_keeps_one_entry_most_recent_first() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut gallery = Gallery::load(LocalStore::new(temp.path().join("store.json")));
        assert!(gallery.save(uri("a")));
        assert!(gallery.save(uri("b")));
        assert!(!gallery.save(uri("a")));
        assert_eq!(gallery.images(), &[uri("b"), uri("a")]);
        Ok(())
    }

    #[test]
    fn delete_keeps_relative_order_and_persists() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut gallery = Gallery::load(LocalStore::new(&path));
        gallery.save(uri("c"));
        gallery.save(uri("b"));
        gallery.save(uri("a"));

        assert_eq!(gallery.delete(0), Some(uri("a")));
        assert_eq!(gallery.delete(5), None);

        let reloaded = Gallery::load(LocalStore::new(&path));
        assert_eq!(reloaded.images(), &[uri("b"), uri("c")]);
        Ok(())
    }

    #[test]
    fn clear_persists_empty_list() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut gallery = Gallery::load(LocalStore::new(&path));
        gallery.save(uri("a"));
        gallery.clear();
        assert!(gallery.is_empty());
        assert_eq!(
            LocalStore::new(&path).get_item(GALLERY_KEY).as_deref(),
            Some("[]")
        );
        Ok(())
    }

    #[test]
    fn malformed_stored_json_loads_empty() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = LocalStore::new(temp.path().join("store.json"));
        store.set_item(GALLERY_KEY, "[\"data:image/png;base64,a\", 42")?;
        let gallery = Gallery::load(store.clone());
        assert!(gallery.is_empty());

        store.set_item(GALLERY_KEY, "{\"not\": \"a list\"}")?;
        assert_eq!(Gallery::load(store).len(), 0);
        Ok(())
    }
}
