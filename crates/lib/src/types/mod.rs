//! Identity model and value types.
//!
//! - [`ActorId`] names a writer.
//! - [`ChangeHash`] addresses a change by content.
//! - [`OpId`], [`ObjId`] and [`ElemId`] name operations, objects and sequence
//!   elements independently of their position in the document tree.
//! - [`ScalarValue`], [`ObjType`] and [`Value`] describe what documents hold.

pub mod actor;
pub mod errors;
pub mod hash;
pub mod ids;
pub mod value;

pub use actor::ActorId;
pub use errors::IdError;
pub use hash::ChangeHash;
pub use ids::{ElemId, Key, ObjId, OpId, Prop};
pub use value::{ObjType, ScalarValue, Value};
