use crate::populations::Genotype;

use std::cell::RefCell;
use std::rc::Rc;

/// Lifecycle notifications fired by [`Genotype::evolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvolutionEvent {
    /// Every chromosome has been assigned a fitness.
    Evaluated,
    /// Selection is done; offspring are about to be produced.
    ReproduceStart,
    /// The new generation is complete and speciated.
    ReproduceFinish,
    /// The generation counter has advanced.
    Evolved,
}

/// The step of the generation cycle a genotype is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvolutionStage {
    Evaluate,
    Select,
    ReproduceStart,
    Reproduce,
    Mutate,
    ReproduceFinish,
    Evolved,
}

/// An observer of evolution, such as a logger or a
/// persistence layer. Listeners get read-only access
/// to the genotype and cannot affect the run.
pub trait EvolutionListener {
    fn on_event(&mut self, event: EvolutionEvent, genotype: &Genotype);
}

impl<F> EvolutionListener for F
where
    F: FnMut(EvolutionEvent, &Genotype),
{
    fn on_event(&mut self, event: EvolutionEvent, genotype: &Genotype) {
        self(event, genotype)
    }
}

/// Lets a caller keep a handle on a listener
/// registered with a genotype.
impl<L: EvolutionListener> EvolutionListener for Rc<RefCell<L>> {
    fn on_event(&mut self, event: EvolutionEvent, genotype: &Genotype) {
        self.borrow_mut().on_event(event, genotype)
    }
}
