pub mod calibration;
pub mod config;
pub mod interruptor;
pub mod metrics;
pub mod pipeline;
pub mod sensor;
pub mod snapshot;
pub mod units;
