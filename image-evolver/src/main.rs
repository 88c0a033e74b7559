use cppneat::genomics::InnovationTracker;
use cppneat::persistence::{MemoryPersistence, Persistence, PersistenceListener};
use cppneat::populations::logging::{EvolutionLogger, ReportingLevel};
use cppneat::populations::{BulkFitnessFunction, Chromosome, ParallelFitness};
use cppneat::{Genotype, NeatConfig, Properties};
use cppneat_nn::cppn::{Cppn, InputScaling, OutputLayer};

use ron::ser::PrettyConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use std::cell::RefCell;
use std::error::Error;
use std::fs;
use std::rc::Rc;

const DEFAULT_PROPERTIES: &str = "
# Population
popul.size = 80
survival.rate = 0.2
selector.elitism = true
selector.elitism.min.specie.size = 4
speciation.threshold = 0.6
random.seed = 42

# Topology
stimulus.size = 4
response.size = 1
input.labels = bias,d,x,y
output.labels = ink
initial.topology.activation = cppn
initial.topology.activation.output = sigmoid

# Mutation
weight.max = 8.0
weight.min = -8.0
weight.mutation.rate = 0.75
weight.mutation.std.dev = 1.0
add.connection.mutation.rate = 0.05
add.neuron.mutation.rate = 0.03
activation.mutation.rate = 0.025
";

/// Side of the rendered square, in pixels.
const IMAGE_SIZE: usize = 16;
const GENERATIONS: usize = 60;
const MAX_FITNESS: f64 = (IMAGE_SIZE * IMAGE_SIZE) as f64;

/// Maps pixel coordinates onto [-1, 1].
fn coordinates() -> impl Iterator<Item = (f64, f64)> {
    let scale = |i: usize| 2.0 * i as f64 / (IMAGE_SIZE - 1) as f64 - 1.0;
    (0..IMAGE_SIZE).flat_map(move |row| (0..IMAGE_SIZE).map(move |col| (scale(col), scale(row))))
}

/// A bright ring around the origin on a dark background.
fn target(x: f64, y: f64) -> f64 {
    let d = x.hypot(y);
    (-(d - 0.6).powi(2) * 25.0).exp()
}

fn render(chromosome: &Chromosome) -> Vec<f64> {
    let mut cppn = Cppn::from_material(chromosome.material(), InputScaling::default());
    coordinates()
        .map(|(x, y)| cppn.render_pixel(x, y, &OutputLayer::Grey)[0])
        .collect()
}

fn ring_fitness(chromosome: &Chromosome) -> f64 {
    let error: f64 = render(chromosome)
        .into_iter()
        .zip(coordinates())
        .map(|(value, (x, y))| (value - target(x, y)).abs())
        .sum();
    (MAX_FITNESS - error).max(0.0)
}

fn ascii(pixels: &[f64]) -> String {
    const SHADES: &[u8] = b" .:-=+*#%@";
    pixels
        .chunks(IMAGE_SIZE)
        .map(|row| {
            row.iter()
                .map(|v| SHADES[((v * (SHADES.len() - 1) as f64).round() as usize).min(SHADES.len() - 1)] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn run() -> Result<(), Box<dyn Error>> {
    let source = match std::env::args().nth(1) {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_PROPERTIES.to_string(),
    };
    let config = NeatConfig::from_properties(&Properties::parse(&source))?;

    let store = MemoryPersistence::new();
    let tracker = InnovationTracker::load(&store)?;
    let persistence = Rc::new(RefCell::new(PersistenceListener::new(store, "ring", false)));

    let mut genotype = Genotype::random_initial(config, tracker);
    genotype.add_listener(Box::new(EvolutionLogger::new(ReportingLevel::NoChromosomes)));
    genotype.add_listener(Box::new(persistence.clone()));

    let mut fitness = ParallelFitness::new(ring_fitness, MAX_FITNESS);
    for _ in 0..GENERATIONS {
        genotype.evolve(&mut fitness)?;
        let best = genotype.fittest().map_or(0.0, |c| c.fitness_value());
        if best >= fitness.max_fitness() * 0.95 {
            info!(generation = genotype.generation(), best, "target reached");
            break;
        }
    }

    let persistence = persistence.borrow();
    let run = persistence.run();
    let champion_id = run
        .generations
        .last()
        .and_then(|g| g.champion_id)
        .ok_or("no generation was evaluated")?;
    let champion = persistence.store().load_chromosome(champion_id)?;

    info!(
        generations = run.generations.len(),
        fitness = champion.fitness_value(),
        neurons = champion.material().neuron_count(),
        connections = champion.material().connection_count(),
        "champion {}",
        champion.id()
    );
    println!("{}\n", ascii(&render(&champion)));
    println!("{}", ron::ser::to_string_pretty(&champion, PrettyConfig::new())?);
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
