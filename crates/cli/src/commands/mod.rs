pub(crate) mod account;
pub(crate) mod password;
pub(crate) mod records;
