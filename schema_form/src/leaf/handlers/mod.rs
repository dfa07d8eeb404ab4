/* Built-in leaf renderers */

mod blob;
mod boolean;
mod null;
mod number;
mod principal;
mod text;
mod timestamp;

pub use blob::BlobHandler;
pub use boolean::BoolHandler;
pub use null::NullHandler;
pub use number::NumberHandler;
pub use principal::PrincipalHandler;
pub use text::TextHandler;
pub use timestamp::TimestampHandler;

/* "must be at most 255 for nat8" -> "Must be at most 255 for nat8" */
pub(crate) fn sentence(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
