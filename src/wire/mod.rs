//! Wire-format handling.
//!
//! Everything between a domain resource and the bytes on the socket lives
//! here: resolving which of the two canonical encodings a request asked for
//! (`format`), rendering the XML form (`xml`), and the response composition
//! decision table (`response`). All three are pure functions of their
//! inputs; no state is carried between requests.

mod format;
mod response;
mod xml;

pub use format::{FormatParameters, NegotiationMode, UnsupportedFormat, WireFormat};
pub use response::compose;
pub use xml::{XmlError, render_xml};
