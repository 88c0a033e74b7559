use crate::Innovation;

use thiserror::Error;

/// An error type indicating the allele being
/// added to a genome would break its invariants.
#[derive(Debug, Error)]
pub(crate) enum AlleleValidityError {
    /// The allele's ID is already used in the genome.
    #[error("duplicate allele insertion with id {0}")]
    DuplicateInnovation(Innovation),
    /// The connection's endpoint does not exist.
    #[error("connection {connection} references nonexistent neuron {neuron}")]
    MissingEndpoint {
        connection: Innovation,
        neuron: Innovation,
    },
    /// The connection's destination is an input neuron.
    #[error("connection {connection} ends in input neuron {neuron}")]
    InputDestination {
        connection: Innovation,
        neuron: Innovation,
    },
    /// The connection links a pair of neurons already linked
    /// by another connection.
    #[error("connection {connection} shadows connection {existing} between {src} -> {dest}")]
    DuplicateEndpoints {
        connection: Innovation,
        existing: Innovation,
        src: Innovation,
        dest: Innovation,
    },
}
