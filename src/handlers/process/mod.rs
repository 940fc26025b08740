// handlers/process/mod.rs - Process monitor handlers

pub mod status; // GET /api/pm2/status

pub use status::process_status;
