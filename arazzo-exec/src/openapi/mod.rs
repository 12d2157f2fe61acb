mod loader;
mod model;
mod op_id;
mod op_path;
mod refs;
mod shape;

pub use loader::{LoadError, Location};
pub(crate) use loader::{load_text, parse_tree};
pub use model::{OpenApiDoc, OpenApiParam, OperationLookupError, ResolvedOperation};
pub use op_id::find_operation_by_id;
pub use op_path::{find_operation_by_path, parse_operation_path_ref, OperationPathRef};
pub use refs::RefError;
