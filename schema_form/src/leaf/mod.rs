/* Leaf renderers: text forms of primitive values */

pub mod handlers;
pub mod registry;
pub mod traits;

pub use registry::LeafRendererRegistry;
pub use traits::{LeafRenderer, Widget};
