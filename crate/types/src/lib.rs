pub mod registry;
pub mod types;

pub use registry::{primitive_names, resolve_primitive};
pub use types::{PrimitiveName, Type, TYPE_NAME_BOOL, TYPE_NAME_INT, TYPE_NAME_REAL, TYPE_NAME_TEXT};
