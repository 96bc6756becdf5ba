pub mod loaders;
pub mod writers;
