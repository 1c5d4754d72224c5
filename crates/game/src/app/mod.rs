mod bootstrap;
mod gameplay;
mod loop_runner;
mod quest;

pub(crate) use loop_runner::run;
