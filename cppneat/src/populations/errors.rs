use crate::ChromosomeId;

use thiserror::Error;

/// Errors that stop a generation from evolving.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvolutionError {
    /// Selection kept no chromosome, so there are
    /// no parents for the next generation.
    #[error("no chromosome survived selection")]
    NoSurvivors,
    /// The fitness function left a chromosome unevaluated.
    #[error("chromosome {0} was not assigned a fitness")]
    Unevaluated(ChromosomeId),
}
