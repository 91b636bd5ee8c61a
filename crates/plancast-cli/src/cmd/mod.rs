pub mod init;
pub mod learn;
pub mod plan;
pub mod predict;
pub mod progress;
pub mod runs;
pub mod simulate;
pub mod stats;
pub mod status;
pub mod suggest;
