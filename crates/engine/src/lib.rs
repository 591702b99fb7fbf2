pub mod aggregator;
pub mod amount;
pub mod explorer;
pub mod normalizer;
