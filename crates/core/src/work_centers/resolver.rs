//! Infor work-center code → internal work_center_id resolution.
//!
//! Maps external codes to internal ids through a configured
//! `{external code → work_center_number}` table. Results are cached
//! process-locally so hot-path resolution touches the database only on
//! misses for unmapped codes.
//!
//! Resolution order:
//!   1. Exact cache hit by code
//!   2. Exact mapping entry, resolved via the repository once and cached
//!   3. Prefix fallback: a mapping key of length >= 2 the code starts with
//!      (e.g. "KOO1" matches the "KOO" entry)
//!   4. None of the above → `(None, warning)`

use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::work_centers_traits::WorkCenterRepositoryTrait;
use crate::errors::Result;

pub struct WorkCenterResolver {
    repository: Arc<dyn WorkCenterRepositoryTrait>,
    mapping: RwLock<HashMap<String, String>>,
    cache: RwLock<HashMap<String, Option<i64>>>,
}

impl WorkCenterResolver {
    /// Builds a resolver from a mapping of external code → work-center number.
    pub fn new(
        repository: Arc<dyn WorkCenterRepositoryTrait>,
        mapping: HashMap<String, String>,
    ) -> Self {
        Self {
            repository,
            mapping: RwLock::new(mapping),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves an external code to `(work_center_id, warning)`.
    ///
    /// Unknown codes and mapped-but-missing work centers return `None` with a
    /// human-readable warning instead of an error; a single unmapped machine
    /// must not abort an import run.
    pub fn resolve(&self, external_code: &str) -> Result<(Option<i64>, Option<String>)> {
        let code = external_code.trim();
        if code.is_empty() {
            return Ok((None, None));
        }

        if let Some(cached) = self.cache.read().unwrap().get(code) {
            return Ok((*cached, None));
        }

        // Exact mapping first, then longest prefix fallback.
        let (target_number, prefix_hit) = {
            let mapping = self.mapping.read().unwrap();
            match mapping.get(code) {
                Some(number) => (Some(number.clone()), None),
                None => {
                    let mut best: Option<(&String, &String)> = None;
                    for (prefix, number) in mapping.iter() {
                        if prefix.len() >= 2 && code.starts_with(prefix.as_str()) {
                            match best {
                                Some((current, _)) if current.len() >= prefix.len() => {}
                                _ => best = Some((prefix, number)),
                            }
                        }
                    }
                    match best {
                        Some((prefix, number)) => {
                            debug!("Prefix match: '{code}' -> '{prefix}' -> {number}");
                            (Some(number.clone()), Some(prefix.clone()))
                        }
                        None => (None, None),
                    }
                }
            }
        };

        let Some(target_number) = target_number else {
            let warning = format!("Unknown Infor WC code '{code}' - not in mapping");
            return Ok((None, Some(warning)));
        };

        // A cached prefix entry already carries the resolved id.
        if let Some(prefix) = &prefix_hit {
            if let Some(cached) = self.cache.read().unwrap().get(prefix).copied() {
                self.cache.write().unwrap().insert(code.to_string(), cached);
                return Ok((cached, None));
            }
        }

        let wc_id = self.repository.id_by_number(&target_number)?;

        let Some(wc_id) = wc_id else {
            let warning = format!("Work center '{target_number}' does not exist");
            return Ok((None, Some(warning)));
        };

        self.cache
            .write()
            .unwrap()
            .insert(code.to_string(), Some(wc_id));
        debug!("Resolved Infor WC '{code}' -> {target_number} (id={wc_id})");
        Ok((Some(wc_id), None))
    }

    /// Pre-resolves every configured mapping entry with one batched lookup.
    /// Call once before processing large batches.
    pub fn warmup_cache(&self) -> Result<()> {
        if !self.cache.read().unwrap().is_empty() {
            return Ok(());
        }

        let mapping = self.mapping.read().unwrap().clone();
        if mapping.is_empty() {
            return Ok(());
        }

        let numbers: Vec<String> = mapping.values().cloned().collect();
        let resolved = self.repository.ids_by_numbers(&numbers)?;
        let by_number: HashMap<String, i64> = resolved.into_iter().collect();

        let mut cache = self.cache.write().unwrap();
        for (external_code, number) in &mapping {
            if let Some(id) = by_number.get(number) {
                cache.insert(external_code.clone(), Some(*id));
            }
        }

        info!(
            "WC cache warmed: {} entries from {} mappings",
            cache.len(),
            mapping.len()
        );
        Ok(())
    }

    pub fn get_mapping(&self) -> HashMap<String, String> {
        self.mapping.read().unwrap().clone()
    }

    /// Replaces the mapping. Clears the cache to force re-resolution.
    pub fn update_mapping(&self, new_mapping: HashMap<String, String>) {
        let count = new_mapping.len();
        *self.mapping.write().unwrap() = new_mapping;
        self.cache.write().unwrap().clear();
        info!("Updated WC mapping: {count} entries");
    }
}
