pub mod radial_cache;

pub use radial_cache::RadialCache;
