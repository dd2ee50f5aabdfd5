//! Core business data structures.

pub mod click;
pub mod geo;
pub mod url;
pub mod validation;

pub use click::{ClickEvent, ClickInfo};
pub use geo::{GeoDetails, UNKNOWN_COUNTRY_CODE};
pub use url::{CanonicalUrl, UrlError, UrlHash, MAX_URL_LEN};
pub use validation::{
    UrlSafety, ValidationJob, ValidationMessage, ValidationResult, ValidationStep,
};
