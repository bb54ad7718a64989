//! XML Reader Module
//!
//! Streaming input side of the parser:
//! - BufferedReader: growable window over any `Read` source
//! - StreamReader: pull reader producing well-formed events
//! - Events: event types handed to the dispatcher

pub mod buffered;
pub mod events;
pub mod stream;

pub use events::XmlEvent;
pub use stream::StreamReader;
