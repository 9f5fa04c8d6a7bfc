mod assembly;
mod cohesive;
mod geometry;
mod mesh;
mod sieve;
mod source;
