//! Per-entity cache manager: declared lookups and coarse invalidation.

use crate::cache::VersionedCache;
use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;
use futures::future::try_join_all;
use log::debug;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;

/// Supplies field values from an entity instance or lookup arguments.
///
/// The manager never branches on the shape of its input; hosts implement
/// this for their own entity representation (an ORM row, a struct, a map).
pub trait FieldSource {
    /// The current value of `field`, or `None` if the source has no such
    /// field.
    fn field_value(&self, field: &str) -> Option<String>;
}

impl FieldSource for HashMap<String, String> {
    fn field_value(&self, field: &str) -> Option<String> {
        self.get(field).cloned()
    }
}

impl<'a> FieldSource for [(&'a str, &'a str)] {
    fn field_value(&self, field: &str) -> Option<String> {
        self.iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| (*value).to_string())
    }
}

/// Cache key declarations for one entity type.
///
/// The declarations are an allow-list: lookups against undeclared field
/// combinations or partitions fail fast instead of silently caching under a
/// typo'd name.
///
/// # Examples
///
/// ```
/// use vercache::EntityKeys;
///
/// let keys = EntityKeys::new("widgets")
///     .with_key_fields(["id"])
///     .with_key_fields(["owner", "slug"])
///     .with_partition("owner");
/// ```
#[derive(Debug, Clone)]
pub struct EntityKeys {
    entity: String,
    key_field_sets: Vec<Vec<String>>,
    partitions: Vec<String>,
    all_label: String,
}

impl EntityKeys {
    /// Start a declaration for an entity storage name (table name analog).
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            key_field_sets: Vec::new(),
            partitions: Vec::new(),
            all_label: "all".to_string(),
        }
    }

    /// Declare an ordered field combination usable for single-item lookups.
    ///
    /// The declared order is part of the cache identity and stays stable
    /// no matter how lookup arguments are passed.
    pub fn with_key_fields<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.key_field_sets
            .push(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a field usable for partition (filtered list) lookups.
    pub fn with_partition(mut self, field: impl Into<String>) -> Self {
        self.partitions.push(field.into());
        self
    }

    /// Override the label for the unfiltered full-set cache slot.
    pub fn with_all_label(mut self, label: impl Into<String>) -> Self {
        self.all_label = label.into();
        self
    }

    /// The entity storage name.
    pub fn entity(&self) -> &str {
        &self.entity
    }
}

/// Per-entity facade over a [`VersionedCache`].
///
/// Translates structured lookups (by declared field combination, by
/// partition, or "all") into versioned cache keys, and bumps every
/// relevant version counter on [`invalidate`](CacheManager::invalidate).
/// One manager is constructed per entity type at application start; there
/// is no hidden registry.
pub struct CacheManager<S: CacheStore> {
    cache: VersionedCache<S>,
    keys: EntityKeys,
    /// sorted field names -> declared-order field names
    lookup: HashMap<Vec<String>, Vec<String>>,
}

impl<S: CacheStore> CacheManager<S> {
    /// Build a manager from declarations.
    ///
    /// Fails with [`CacheError::Configuration`] when no key field set is
    /// declared or two declared sets collapse to the same unordered form.
    pub fn new(cache: VersionedCache<S>, keys: EntityKeys) -> CacheResult<Self> {
        if keys.key_field_sets.is_empty() {
            return Err(CacheError::Configuration(format!(
                "no cache key fields declared for entity '{}'",
                keys.entity
            )));
        }

        let mut lookup = HashMap::new();
        for set in &keys.key_field_sets {
            let mut sorted = set.clone();
            sorted.sort();
            if lookup.insert(sorted, set.clone()).is_some() {
                return Err(CacheError::Configuration(format!(
                    "duplicate cache key field set {:?} for entity '{}'",
                    set, keys.entity
                )));
            }
        }

        Ok(Self {
            cache,
            keys,
            lookup,
        })
    }

    /// The entity declarations this manager was built from.
    pub fn keys(&self) -> &EntityKeys {
        &self.keys
    }

    /// Resolve lookup field names to their declared-order form.
    fn declared_fields(&self, names: &[&str]) -> CacheResult<&[String]> {
        let mut sorted: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        sorted.sort();
        self.lookup
            .get(&sorted)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                CacheError::Configuration(format!(
                    "cache key fields {:?} were not declared for entity '{}'",
                    sorted, self.keys.entity
                ))
            })
    }

    /// Compose `<entity>-<field>-<value>...` in declared field order.
    fn fields_key<V>(&self, declared: &[String], value_of: V) -> CacheResult<String>
    where
        V: Fn(&str) -> Option<String>,
    {
        let mut key = self.keys.entity.clone();
        for field in declared {
            let value = value_of(field).ok_or_else(|| {
                CacheError::Configuration(format!(
                    "missing value for declared cache key field '{}' on entity '{}'",
                    field, self.keys.entity
                ))
            })?;
            key.push('-');
            key.push_str(field);
            key.push('-');
            key.push_str(&value);
        }
        Ok(key)
    }

    fn partition_key(&self, partition: &str, value: &str) -> String {
        format!("{}-{}-{}", self.keys.entity, partition, value)
    }

    fn label_key(&self, label: &str) -> String {
        format!("{}-{}", self.keys.entity, label)
    }

    /// Get a single item by a declared field combination, with the
    /// refreshed flag.
    ///
    /// Field arguments may be passed in any order; they are validated
    /// against the declarations and the key is composed in declared order.
    /// An undeclared combination fails with [`CacheError::Configuration`]
    /// before any backend call.
    pub async fn getf<T, F, Fut>(
        &self,
        fields: &[(&str, &str)],
        producer: F,
    ) -> CacheResult<(T, bool)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let declared = self.declared_fields(&names)?;
        let key = self.fields_key(declared, |field| fields.field_value(field))?;
        let versioned = self.cache.version(&key).await?;
        self.cache.get_or_compute(&versioned, producer, None).await
    }

    /// Get a single item by a declared field combination.
    pub async fn get<T, F, Fut>(&self, fields: &[(&str, &str)], producer: F) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let (item, _refreshed) = self.getf(fields, producer).await?;
        Ok(item)
    }

    /// Get the list of items sharing `partition = value`, with the
    /// refreshed flag.
    pub async fn partitionf<T, F, Fut>(
        &self,
        partition: &str,
        value: &str,
        producer: F,
    ) -> CacheResult<(Vec<T>, bool)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<Vec<T>>>,
    {
        if !self.keys.partitions.iter().any(|p| p == partition) {
            return Err(CacheError::Configuration(format!(
                "partition '{}' was not declared for entity '{}'",
                partition, self.keys.entity
            )));
        }

        let key = self.partition_key(partition, value);
        let versioned = self.cache.version(&key).await?;
        self.cache.get_or_compute(&versioned, producer, None).await
    }

    /// Get the list of items sharing `partition = value`.
    pub async fn partition<T, F, Fut>(
        &self,
        partition: &str,
        value: &str,
        producer: F,
    ) -> CacheResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<Vec<T>>>,
    {
        let (items, _refreshed) = self.partitionf(partition, value, producer).await?;
        Ok(items)
    }

    /// Get the unfiltered full set, with the refreshed flag.
    pub async fn allf<T, F, Fut>(&self, producer: F) -> CacheResult<(Vec<T>, bool)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<Vec<T>>>,
    {
        let key = self.label_key(&self.keys.all_label);
        let versioned = self.cache.version(&key).await?;
        self.cache.get_or_compute(&versioned, producer, None).await
    }

    /// Get the unfiltered full set.
    pub async fn all<T, F, Fut>(&self, producer: F) -> CacheResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<Vec<T>>>,
    {
        let (items, _refreshed) = self.allf(producer).await?;
        Ok(items)
    }

    /// Invalidate every cache slot that could hold this instance.
    ///
    /// Bumps the version for each declared key field set (composed from the
    /// instance's current values), each declared partition slot, and the
    /// all-slot. Deliberately coarse: any mutation invalidates every
    /// declared slot for the instance, whether or not the changed field is
    /// part of a key. The host calls this exactly once per
    /// create/update/delete.
    pub async fn invalidate(&self, source: &impl FieldSource) -> CacheResult<()> {
        let mut names = Vec::with_capacity(self.keys.key_field_sets.len() + self.keys.partitions.len() + 1);

        for set in &self.keys.key_field_sets {
            names.push(self.fields_key(set, |field| source.field_value(field))?);
        }

        for partition in &self.keys.partitions {
            let value = source.field_value(partition).ok_or_else(|| {
                CacheError::Configuration(format!(
                    "missing value for declared partition '{}' on entity '{}'",
                    partition, self.keys.entity
                ))
            })?;
            names.push(self.partition_key(partition, &value));
        }

        names.push(self.label_key(&self.keys.all_label));

        debug!(
            "Invalidating {} cache names for entity '{}'",
            names.len(),
            self.keys.entity
        );
        try_join_all(names.iter().map(|name| self.cache.incr(name))).await?;
        Ok(())
    }
}

impl<S: CacheStore> Clone for CacheManager<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            keys: self.keys.clone(),
            lookup: self.lookup.clone(),
        }
    }
}
