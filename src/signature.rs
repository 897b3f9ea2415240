// Signature preloading: resolve every signer's raster image before any
// layout work starts, since row-height measurement depends on whether an
// image will be available.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use ::image::DynamicImage;

use crate::model::Entry;

/// Image bytes by content key. A local path or an http(s) URL; which one is
/// the store's business, not the renderer's.
pub trait ImageStore {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, String>;
}

/// Production store: http(s) keys go over the wire, everything else is a
/// filesystem path.
pub struct LocalRemoteStore;

impl ImageStore for LocalRemoteStore {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, String> {
        if key.starts_with("http://") || key.starts_with("https://") {
            let response = ureq::get(key)
                .call()
                .map_err(|e| format!("Failed to fetch URL: {e}"))?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| format!("Failed to read response: {e}"))?;
            Ok(bytes)
        } else {
            std::fs::read(key).map_err(|e| format!("{key}: {e}"))
        }
    }
}

/// Signer id -> decoded image. Built once per render, immutable afterwards.
/// Absence of a key is a valid state, not an error.
pub type SignatureCache = HashMap<String, DynamicImage>;

/// Fetch and decode one image, logging and absorbing any failure.
pub fn load_image(store: &dyn ImageStore, key: &str) -> Option<DynamicImage> {
    let bytes = match store.fetch(key) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Skipping image {key}: {e}");
            return None;
        }
    };
    match ::image::load_from_memory(&bytes) {
        Ok(img) => Some(img),
        Err(e) => {
            log::warn!("Skipping image {key}: decode error: {e}");
            None
        }
    }
}

/// Preload signature images for every unique signer that has a signature
/// reference. A fetch or decode failure omits the signer from the cache and
/// never raises.
pub fn preload(entries: &[Entry], store: &dyn ImageStore) -> SignatureCache {
    let mut cache = SignatureCache::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for entry in entries {
        let (Some(signer), Some(reference)) = (&entry.signed_by, &entry.signature_ref) else {
            continue;
        };
        if !seen.insert(signer.as_str()) {
            continue;
        }
        if let Some(img) = load_image(store, reference) {
            cache.insert(signer.clone(), img);
        }
    }
    cache
}
