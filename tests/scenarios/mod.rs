mod basic_pipeline;
mod deadlock;
mod pipeline_safe_cycle;
mod realtimesafe_blocking;
mod rendezvous;
mod try_propagation;
