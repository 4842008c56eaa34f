//! Conversion pipeline orchestration.
//!
//! - [`ConversionBuilder`]: fluent builder gathering inputs, output location,
//!   options and cache configuration
//! - [`Conversion`]: a built conversion; [`Conversion::run`] converts, writes
//!   the tagged text and saves the settings
//!
//! # Example
//!
//! ```ignore
//! use tagpress::ConversionBuilder;
//!
//! let report = ConversionBuilder::new("chapter.md")
//!     .with_output("chapter.txt")
//!     .build()?
//!     .run()?;
//! ```

mod builder;
mod conversion;

pub use builder::{ConversionBuilder, DEFAULT_CACHE_DIR};
pub use conversion::{Conversion, ConversionReport};
