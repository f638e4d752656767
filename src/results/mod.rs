// Result reading is split into:
// - row: the associative row type handed to callers
// - iterator: the forward-only cursor over a driver statement
// - result_set: the read-only collection view that owns the cursor

pub mod iterator;
pub mod result_set;
pub mod row;

pub use iterator::{ColumnIter, Hydrator, ResultIterator};
pub use result_set::ResultSet;
pub use row::{ColumnRef, Row};
