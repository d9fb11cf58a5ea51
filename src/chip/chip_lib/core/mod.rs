pub mod case_auth_tag;
pub mod chip_error;
pub mod chip_static_assert;
pub mod data_model_types;
pub mod node_id;
pub mod tlv_reader;
pub mod tlv_tags;
pub mod tlv_types;
pub mod tlv_writer;
