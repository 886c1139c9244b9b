/*!
 * Protocol layer — the data structures a dispatch carries.
 *
 * Everything related to *what* a dispatch moves around:
 * - `request` — immutable request descriptor, methods, credentials, resolvers
 * - `response` — response metadata and the pre-transfer placeholder
 * - `outcome` — the single tagged success-or-failure result of a dispatch
 */

pub mod outcome;
pub mod request;
pub mod response;

pub use outcome::{Failure, Outcome, Reply};
pub use request::{
    Credentials, DestinationResolver, Method, ProgressHandler, Request, SourceResolver,
};
pub use response::Response;
