pub mod auto_config_service;
pub mod crm_service;
pub mod estimate_session;
pub mod export_service;
pub mod history;
pub mod pricing_service;
pub mod room_normalizer;
