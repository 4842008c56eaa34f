use tagpress_style::StyleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Style configuration error: {0}")]
    Style(#[from] StyleError),
}
