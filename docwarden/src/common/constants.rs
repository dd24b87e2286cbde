/// Name of the identifier field used when an entity does not override it.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Separator between the segments of an embedded field path (`address.city`).
pub const FIELD_SEPARATOR: &str = ".";

/// Topic under which collection events travel on the event bus.
pub const WARDEN_EVENT: &str = "warden_event";

/// Patch operator that merges its document into the target.
pub const PATCH_SET: &str = "$set";

/// Patch operator that removes the listed fields from the target.
pub const PATCH_UNSET: &str = "$unset";

/// Patch operator that adds numeric deltas to the target's fields.
pub const PATCH_INC: &str = "$inc";

/// Field holding the group key in documents produced by a group stage.
pub const GROUP_KEY_FIELD: &str = "_id";
