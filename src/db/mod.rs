pub mod catalog;
pub mod mongo;
pub mod repository;
