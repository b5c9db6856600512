// Command table for the signal-bus collaborator
//
// External commands arrive as (device, name, payload) triples. The table maps
// each stable name to one handler; handlers parse the payload and call into
// the stage, where the session guard applies.
//
// - trait_def: request/reply types and the handler signature
// - commands: one handler per command
// - manager: the name -> handler dispatch map

pub mod commands;
pub mod manager;
pub mod trait_def;

pub use manager::CommandTable;
pub use trait_def::{CommandRequest, Handler, Reply};
