pub mod asn1;
pub mod chip_lib;
pub mod credentials;
pub mod crypto;

pub use chip_lib::core::data_model_types::FabricId;
pub use chip_lib::core::node_id::NodeId;
pub use chip_lib::support::logging;
