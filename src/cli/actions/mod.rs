pub mod server;

use crate::admission::RouteTables;

#[derive(Debug)]
pub enum Action {
    Server { port: u16, tables: RouteTables },
}
