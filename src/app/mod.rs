//! Application orchestration module

pub mod initialization;
pub mod execution;
pub mod repository;

pub use repository::resolve_repository_path;
pub use initialization::{
    build_settings,
    configure_logging,
    create_colour_manager,
    load_configuration,
    Settings,
};
pub use execution::{run_pipeline, PipelineOutcome};
