use cppneat::Innovation;

use std::fmt;

/// An incoming connection of a network neuron.
#[derive(Clone, Copy, PartialEq)]
pub(crate) struct Connection {
    pub id: Innovation,
    /// Index of the source neuron.
    pub src: usize,
    pub weight: f64,
    /// The source value latched at the last step,
    /// for recurrent connections.
    pub cache: Option<f64>,
}

impl Connection {
    /// Creates a connection reading its source's current value.
    pub fn feed_forward(id: Innovation, src: usize, weight: f64) -> Connection {
        Connection {
            id,
            src,
            weight,
            cache: None,
        }
    }

    /// Creates a connection reading its source's
    /// value from the previous step.
    pub fn recurrent(id: Innovation, src: usize, weight: f64) -> Connection {
        Connection {
            id,
            src,
            weight,
            cache: Some(0.0),
        }
    }

    pub fn is_recurrent(&self) -> bool {
        self.cache.is_some()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {} {:.9}", self.id, self.src, self.weight)?;
        if self.is_recurrent() {
            write!(f, " (cached)")?;
        }
        Ok(())
    }
}
