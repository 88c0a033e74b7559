use crate::genomics::ChromosomeMaterial;

use rand::Rng;

impl ChromosomeMaterial {
    /// Produces an offspring genome from `self` (the dominant
    /// parent) and `other` (the recessive one).
    ///
    /// Alleles are aligned by innovation number. Matching alleles
    /// are inherited from either parent with equal chance, alleles
    /// only the dominant parent has are always inherited, and
    /// alleles only the recessive parent has are dropped.
    ///
    /// The offspring's parent ids are left unset.
    ///
    /// # Examples
    /// ```
    /// use cppneat::genomics::{ChromosomeMaterial, GeneticConfig, InnovationTracker};
    ///
    /// let config = GeneticConfig {
    ///     input_count: 2,
    ///     output_count: 1,
    ///     initial_fully_connected: true,
    ///     weight_min: -1.0,
    ///     weight_max: 1.0,
    ///     weight_mutation_std_dev: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = cppneat::rng::seeded(0);
    /// let genome = ChromosomeMaterial::initial(&config, &mut InnovationTracker::new(), &mut rng);
    ///
    /// let child = genome.mate_with(&genome, &mut rng);
    ///
    /// assert_eq!(
    ///     child.alleles().map(|a| a.innovation()).collect::<Vec<_>>(),
    ///     genome.alleles().map(|a| a.innovation()).collect::<Vec<_>>(),
    /// );
    /// ```
    pub fn mate_with<R: Rng + ?Sized>(&self, other: &ChromosomeMaterial, rng: &mut R) -> ChromosomeMaterial {
        let mut child = ChromosomeMaterial::new();

        for neuron in self.neurons() {
            let inherited = match other.neuron(neuron.innovation()) {
                Some(recessive) if rng.gen::<bool>() => recessive,
                _ => neuron,
            };
            child.add_neuron(inherited.clone());
        }
        for connection in self.connections() {
            let inherited = match other.connection(connection.innovation()) {
                Some(recessive) if rng.gen::<bool>() => recessive,
                _ => connection,
            };
            child.add_connection(inherited.clone());
        }

        child
    }
}
