mod dict;
mod read_op;
mod structural_op;
mod typed_op;
mod write_op;

pub use dict::SpookyDict;
