pub mod arena;
pub mod bff;
pub mod driver;
pub mod mutator;
pub mod pairing;
pub mod rng;
pub mod runlog;
pub mod stats;
pub mod token;
pub mod workers;
