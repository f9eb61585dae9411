mod client;
mod endpoint;
mod properties;

pub use client::{
    ClientError, ContentClient, PostBody, PostOutcome, RemoteError, SlingClient,
    remove_trailing_slash,
};
pub use endpoint::{
    DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USER, Endpoint, ImportOptions,
};
pub use properties::{
    MULTI_VALUE_HINT, PropertyBag, PropertyValue, Scalar, TYPE_HINT_SUFFIX, form_fields,
    namespaced,
};
