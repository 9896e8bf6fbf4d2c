pub mod list_instances;
pub mod restart_app;
