mod datastore;
mod init;
mod users;

pub use datastore::cmd_check_datastore;
pub use init::cmd_init;
pub use users::cmd_list_users;
