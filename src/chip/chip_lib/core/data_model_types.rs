pub type FabricId = u64;

pub const KUNDEFINED_FABRIC_ID: FabricId = 0;

pub fn is_valid_fabric_id(fabric_id: FabricId) -> bool {
    fabric_id != KUNDEFINED_FABRIC_ID
}
