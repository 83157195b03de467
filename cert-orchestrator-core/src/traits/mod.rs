//! 外部协作者抽象 Trait

mod domain_repository;
mod process_runner;

pub use domain_repository::DomainRepository;
pub use process_runner::{CommandSpec, ProcessOutput, ProcessRunner, TokioProcessRunner};
