pub mod context;
pub mod document;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod frame;
pub mod keys;
pub mod page;
pub mod scope;
pub mod special;

pub use context::{BuildContext, FsLoader, Loader, MemoryLoader, Session};
pub use engine::{Rendered, expand, render_page};
pub use error::{DiagnosticError, ExpandError};
pub use page::{Collections, Meta, Page};
pub use scope::Scope;
pub use special::DeferredAction;
