//! Value objects - immutable types that represent domain concepts

mod changed_fields;
mod ids;

pub use changed_fields::ChangedFields;
pub use ids::{Jid, MessageId};
