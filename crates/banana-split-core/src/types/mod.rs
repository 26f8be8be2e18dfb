/*
[INPUT]:  Session, signature and provider schema definitions
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - shared type definitions
[UPDATE]: When provider schema changes or new types added
*/

pub mod enums;
pub mod models;
pub mod responses;

pub use enums::*;
pub use models::*;
pub use responses::*;
