use tagpress_types::Realm;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("no base style configured for the {0} realm")]
    MissingBase(Realm),
}
