//! Web framework integration surface.
//!
//! This module runs the request-binding order in-process:
//! 1. `default` tags seed the destination record
//! 2. path, query, header, file and form values are set, in that order
//! 3. `validate` tags are evaluated
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: This module contains no framework-specific code.
//!    It defines interfaces that framework-specific code can implement.
//!
//! 2. **No Body Decoding**: JSON and other body formats belong to the caller.
//!    Body-classified fields are left untouched by the binder.
//!
//! 3. **Explicit Context**: No global state. All context flows through values.
//!
//! # Integration Model
//!
//! Framework-specific code should either:
//! - implement [`BindSource`] for its request type, or
//! - copy the request into a [`RequestAdapter`]
//!
//! and then call [`Binder::bind`] with a destination record.
//!
//! # Example Flow
//!
//! ```ignore
//! // In a framework-specific integration (e.g., axum, actix):
//!
//! // 1. Copy the request parts
//! let adapter = RequestAdapter::from(http_req);
//!
//! // 2. Bind and validate
//! let mut form = SignupForm::default();
//! let report = Binder::default().bind(&adapter, &mut form)?;
//!
//! // 3. Respond
//! if !report.is_valid() {
//!     return bad_request(report.to_string());
//! }
//! ```

mod adapter;
mod binder;
mod extract;

pub use adapter::RequestAdapter;
pub use binder::Binder;
pub use extract::{BindSource, SourceValue};
