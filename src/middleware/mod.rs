pub mod request_context;

pub use request_context::{
    make_span_with_request_id, request_id_middleware, require_user_middleware, RequestId,
    REQUEST_ID_HEADER, USER_ID_HEADER,
};
