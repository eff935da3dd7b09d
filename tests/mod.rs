// Integration tests for migrun

pub mod integration;
