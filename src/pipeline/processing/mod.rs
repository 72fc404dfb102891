pub mod filter;
pub mod normalize;
pub mod registry;
pub mod resolver;
