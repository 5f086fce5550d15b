//! API response types and pagination utilities

pub mod pagination;
pub mod response;

#[allow(unused_imports)]
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
#[allow(unused_imports)]
pub use response::{Created, DataResponse, MessageResponse};
