/// Speed of light in vacuum (m/s)
pub const C: f64 = 299_792_458.0;

/// Boltzmann constant (J/K)
pub const BOLTZMANN: f64 = 1.380_648_52e-23;

/// Default receiver noise temperature (K)
pub const NOISE_TEMPERATURE: f64 = 290.0;
