//! Subcommand handlers.

mod install;
mod listbucket;

pub(crate) use install::handle_install;
pub(crate) use listbucket::handle_listbucket;
