// Application layer - Simulation, session lifecycle and advisory use cases
pub mod advisory_client;
pub mod advisory_service;
pub mod boot_sequence;
pub mod history_window;
pub mod log_bus;
pub mod metric_sampler;
pub mod session;
pub mod session_controller;
pub mod simulator;
