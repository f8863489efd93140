pub mod catalog;
pub mod fetch;
pub mod manifest;
pub mod process;
pub mod prompt;
pub mod status;

use crate::cli::DatabaseArgs;
use crate::db::DatabaseTarget;

pub fn database_target(args: &DatabaseArgs, password: String) -> DatabaseTarget {
    DatabaseTarget {
        dbname: args.dbname.clone(),
        host: args.host.clone(),
        port: args.port,
        user: args.user.clone(),
        password,
        schema: args.schema.clone(),
    }
}
