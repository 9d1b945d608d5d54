pub mod frontmatter;

pub use frontmatter::{parse_document, serialize_document, Document};
