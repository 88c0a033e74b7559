use crate::persistence::Persistence;
use crate::{ConfigError, Innovation};

use ahash::RandomState;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::collections::HashMap;
use std::hash::Hash;

/// An `InnovationTracker` keeps track of structural
/// innovations in a population, in order to make sure
/// identical mutations are assigned the same innovation
/// numbers.
///
/// For connection innovations the source and destination
/// neurons identify identical mutations. For neuron
/// innovations the split connection does.
///
/// Every number minted by the tracker is unique, whether
/// it ends up naming a neuron or a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationTracker {
    next_innovation: Innovation,
    #[serde(with = "entries")]
    connection_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    #[serde(with = "entries")]
    neuron_innovations: HashMap<Innovation, Innovation, RandomState>,
}

impl Default for InnovationTracker {
    fn default() -> Self {
        InnovationTracker::new()
    }
}

impl InnovationTracker {
    /// Creates an empty tracker whose first
    /// minted innovation number is 0.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::InnovationTracker;
    ///
    /// let mut tracker = InnovationTracker::new();
    ///
    /// assert_eq!(tracker.mint(), 0);
    /// assert_eq!(tracker.mint(), 1);
    /// ```
    pub fn new() -> InnovationTracker {
        InnovationTracker {
            next_innovation: 0,
            connection_innovations: HashMap::default(),
            neuron_innovations: HashMap::default(),
        }
    }

    /// Loads a previously stored tracker, or creates an empty
    /// one if the store holds none.
    ///
    /// # Errors
    /// Returns [`ConfigError::IdFactory`] if the store fails,
    /// as continuing with a fresh counter could reuse ids.
    pub fn load(store: &dyn Persistence) -> Result<InnovationTracker, ConfigError> {
        match store.load_innovations() {
            Ok(Some(tracker)) => Ok(tracker),
            Ok(None) => Ok(InnovationTracker::new()),
            Err(e) => Err(ConfigError::IdFactory(e)),
        }
    }

    /// Mints a brand new innovation number.
    pub fn mint(&mut self) -> Innovation {
        let id = self.next_innovation;
        self.next_innovation += 1;
        id
    }

    /// Returns the innovation number of the connection
    /// `src -> dest`, minting and recording one if the
    /// connection has never been seen.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::InnovationTracker;
    ///
    /// let mut tracker = InnovationTracker::new();
    /// let id = tracker.find_or_create_connection_id(3, 7);
    ///
    /// assert_eq!(tracker.find_or_create_connection_id(3, 7), id);
    /// assert_ne!(tracker.find_or_create_connection_id(7, 3), id);
    /// ```
    pub fn find_or_create_connection_id(&mut self, src: Innovation, dest: Innovation) -> Innovation {
        if let Some(id) = self.connection_innovations.get(&(src, dest)) {
            return *id;
        }
        let id = self.mint();
        self.connection_innovations.insert((src, dest), id);
        id
    }

    /// Returns the innovation number of the neuron that splits
    /// the connection `split_connection`, minting and recording
    /// one if the split has never been seen.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::InnovationTracker;
    ///
    /// let mut tracker = InnovationTracker::new();
    /// let connection = tracker.find_or_create_connection_id(0, 1);
    /// let neuron = tracker.find_or_create_neuron_id(connection);
    ///
    /// assert_eq!(tracker.find_or_create_neuron_id(connection), neuron);
    /// ```
    pub fn find_or_create_neuron_id(&mut self, split_connection: Innovation) -> Innovation {
        if let Some(id) = self.neuron_innovations.get(&split_connection) {
            return *id;
        }
        let id = self.mint();
        self.neuron_innovations.insert(split_connection, id);
        id
    }

    /// Returns the recorded innovation number of
    /// the connection `src -> dest`, if any.
    pub fn connection_id(&self, src: Innovation, dest: Innovation) -> Option<Innovation> {
        self.connection_innovations.get(&(src, dest)).copied()
    }

    /// Returns the recorded innovation number of
    /// the neuron splitting `split_connection`, if any.
    pub fn neuron_id(&self, split_connection: Innovation) -> Option<Innovation> {
        self.neuron_innovations.get(&split_connection).copied()
    }

    /// Forgets every recorded structural mutation,
    /// but keeps the innovation count, so later mutations
    /// never reuse an already minted number.
    pub fn clear_mappings(&mut self) {
        self.connection_innovations.clear();
        self.neuron_innovations.clear();
    }

    /// Returns the highest innovation number minted so far,
    /// or `None` if none has been.
    pub fn max_innovation(&self) -> Option<Innovation> {
        if self.next_innovation == 0 {
            None
        } else {
            Some(self.next_innovation - 1)
        }
    }

    /// Returns an iterator over the record of connection
    /// innovations, in the format `((src, dest), connection)`.
    /// No ordering is guaranteed.
    pub fn connection_history(&self) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.connection_innovations.iter()
    }

    /// Returns an iterator over the record of neuron
    /// innovations, in the format `(split connection, neuron)`.
    /// No ordering is guaranteed.
    pub fn neuron_history(&self) -> impl Iterator<Item = (&Innovation, &Innovation)> {
        self.neuron_innovations.iter()
    }
}

/// Stores a map as a key-ordered sequence of `(key, value)`
/// pairs, so keys need not be strings.
mod entries {
    use super::*;

    pub fn serialize<K, V, S>(map: &HashMap<K, V, RandomState>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize + Ord,
        V: Serialize,
        S: Serializer,
    {
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        serializer.collect_seq(entries)
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<HashMap<K, V, RandomState>, D::Error>
    where
        K: Deserialize<'de> + Eq + Hash,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(Vec::<(K, V)>::deserialize(deserializer)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;

    #[test]
    fn connection_and_neuron_ids_never_collide() {
        let mut tracker = InnovationTracker::new();
        let c1 = tracker.find_or_create_connection_id(0, 1);
        let n1 = tracker.find_or_create_neuron_id(c1);
        let c2 = tracker.find_or_create_connection_id(0, n1);
        let c3 = tracker.find_or_create_connection_id(n1, 1);
        let mut ids = vec![c1, n1, c2, c3];
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(tracker.max_innovation(), Some(3));
    }

    #[test]
    fn clearing_mappings_keeps_counting() {
        let mut tracker = InnovationTracker::new();
        let before = tracker.find_or_create_connection_id(0, 1);
        tracker.clear_mappings();
        let after = tracker.find_or_create_connection_id(0, 1);
        assert!(after > before);
        assert_eq!(tracker.connection_id(0, 1), Some(after));
    }

    #[test]
    fn serialization() {
        let mut tracker = InnovationTracker::new();
        let connection = tracker.find_or_create_connection_id(0, 1);
        let neuron = tracker.find_or_create_neuron_id(connection);
        tracker.find_or_create_connection_id(neuron, 1);

        let json = serde_json::to_string(&tracker).unwrap();
        let mut restored: InnovationTracker = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.connection_id(0, 1), Some(connection));
        assert_eq!(restored.connection_id(neuron, 1), Some(2));
        assert_eq!(restored.neuron_id(connection), Some(neuron));
        assert_eq!(restored.max_innovation(), Some(2));
        assert_eq!(restored.mint(), 3);
    }

    #[test]
    fn loads_stored_tracker_or_starts_fresh() {
        let mut store = MemoryPersistence::new();
        assert_eq!(InnovationTracker::load(&store).unwrap().max_innovation(), None);

        let mut tracker = InnovationTracker::new();
        tracker.find_or_create_connection_id(4, 5);
        store.store_innovations(&tracker).unwrap();

        let mut loaded = InnovationTracker::load(&store).unwrap();
        assert_eq!(loaded.connection_id(4, 5), Some(0));
        assert_eq!(loaded.mint(), 1);
    }
}
