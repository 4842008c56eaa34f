//! Styles of one conversion run.
//!
//! The [`StyleRegistry`] owns every style. [`ManualStyles`] derives styles from
//! ad-hoc formatting and [`RuleSet`] substitutes styles by user rules.

mod error;
pub mod manual;
pub mod registry;
pub mod rules;
pub mod special;
mod style;

pub use error::StyleError;
pub use manual::{ManualFormatCustomStyle, ManualStyles};
pub use registry::{BASIC_TABLE_STYLE, BaseStyles, StyleRegistry};
pub use rules::{Rule, RuleContext, RuleSet, StyleRef};
pub use special::{COMMENT_TEXT_STYLE, SPECIAL_GROUP, SpecialStyles};
pub use style::{Style, StyleId, section_name};
