//! Fixed-size rtnetlink wire structures and their enumerations.

pub mod addr;
pub mod family;
pub mod route;

pub use family::Family;
