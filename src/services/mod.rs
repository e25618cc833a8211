pub mod colour_math;
pub mod formula_search;
pub mod linear_fit;
pub mod live_simulator;
pub mod mix_predictor;
pub mod reference_model;

#[cfg(test)]
pub(crate) mod test_support;
