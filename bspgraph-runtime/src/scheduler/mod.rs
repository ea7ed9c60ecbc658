pub mod superstep_coordinator;
pub mod worker;
