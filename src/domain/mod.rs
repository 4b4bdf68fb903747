//! Business rules with no I/O. Services load rows, ask these functions what
//! the next state is, and persist the answer inside their transaction.

pub mod credit;
pub mod earnings;
pub mod lifecycle;
pub mod pricing;
