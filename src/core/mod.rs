//! Core XML parsing primitives
//!
//! Building blocks used by the streaming reader:
//! - Scanner: memchr-accelerated cursor over a complete markup slice
//! - Entities: reference decoding with Cow (zero-copy when possible)
//! - Attributes: strict attribute list parsing
//! - Name: element name triple and prefix splitting
//! - Namespace: scoped prefix bindings
//! - DTD: general entities from the DOCTYPE internal subset

pub mod attributes;
pub mod dtd;
pub mod entities;
pub mod name;
pub mod namespace;
pub mod scanner;
