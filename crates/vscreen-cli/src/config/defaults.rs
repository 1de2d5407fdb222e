pub struct DefaultsConfig {
    pub n_cpu: i64,
    pub chunksize: usize,
    pub num_modes: u32,
    pub energy_range: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            n_cpu: -1,
            chunksize: 100,
            num_modes: 9,
            energy_range: 3.0,
        }
    }
}
