//! docsmith-render
//!
//! Everything between a render request and a previewable PDF: the HTTP
//! transport, the dispatcher with its generation counter, response
//! disambiguation, bounded retry, and the preview slot.

pub mod disambiguate;
pub mod dispatcher;
pub mod preview;
pub mod renderer;
pub mod retry;
pub mod transport;

pub use disambiguate::{Disambiguation, PayloadKind, classify, disambiguate};
pub use dispatcher::{Dispatcher, RenderEndpoints, plan_request};
pub use preview::{PreviewHandle, PreviewSlot};
pub use renderer::{RenderOutcome, Renderer};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper, with_retry};
pub use transport::{BoxFuture, HttpMethod, HttpRequest, HttpTransport, UreqTransport};
