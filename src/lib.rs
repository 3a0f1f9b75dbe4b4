#[doc(inline)]
pub use sqleger::*;
