#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use scalespace_tensor as tensor;

#[doc(inline)]
pub use scalespace_imgproc as imgproc;
