//! Concrete field kinds

mod bytes;
mod filename;
mod list;
mod method;
mod net;
mod number;
mod primitives;
mod string;

pub use bytes::{BytesField, Encoding};
pub use filename::{Exists, FilenameField};
pub use list::{ItemValidator, ListField, ListProxy};
pub use method::{BoundMethod, CallArgs, InstanceMethodField, MethodFn};
pub use net::{HostnameField, IPv4AddressField, IPv4NetworkField};
pub use number::{FloatField, IntField};
pub use primitives::{BoolField, DictField, Getter, VirtualField, FALSE_VALUES, TRUE_VALUES};
pub use string::{
    ApplicationModeField, Case, Strip, StringField, UrlField, DEFAULT_MODES, LOG_LEVELS,
};
