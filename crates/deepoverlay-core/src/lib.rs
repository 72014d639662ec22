//! # DeepOverlay Core
//!
//! Core types shared by every DeepOverlay crate:
//! - geometry in viewport and page coordinate spaces
//! - the annotation box model and its anchor binding
//! - the persisted record format (`l`/`t`/`w`/`h`, `anchor`, `rX`...)
//! - page URL normalization
//! - the cross-context control protocol
//! - error types

pub mod annotation;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod protocol;
pub mod record;
pub mod url;

pub use annotation::{AnchorBinding, AnnotationBox, BoxId, Locator, RatioBinding};
pub use error::{Error, Result};
pub use geometry::{Point, Rect};
pub use protocol::{Ack, ControlMessage, ControlResponse, StatusReport};
pub use record::{decode_box, decode_page, encode_page, DecodedBox, StoredBox};
pub use url::PageUrl;
